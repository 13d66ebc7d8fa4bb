// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// sysMaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//! Endpoint reachability. Only "a response came back" is observed: refused
//! connections, DNS failures and timeouts all read as unreachable.
use reqwest::blocking::Client;
use reqwest::Url;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::*;

/// A reachability predicate over URLs.
pub trait Probe {
    ///
    fn is_reachable(&self, url: &str) -> bool;
}

/// Probes http(s) URLs with one GET request and tcp URLs with a connect.
pub struct NetProbe {
    client: Client,
    timeout: Duration,
}

impl NetProbe {
    ///
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .no_proxy()
            .build()
            .context(HttpSnafu)?;

        Ok(NetProbe { client, timeout })
    }

    fn tcp_reachable(&self, url: &Url) -> bool {
        let (host, port) = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => (h, p),
            _ => return false,
        };
        let addrs = match (host, port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                log::debug!("failed to resolve {}: {}", host, e);
                return false;
            }
        };

        addrs
            .into_iter()
            .any(|addr| TcpStream::connect_timeout(&addr, self.timeout).is_ok())
    }
}

impl Probe for NetProbe {
    fn is_reachable(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                log::debug!("invalid url {}: {}", url, e);
                return false;
            }
        };

        let reachable = match parsed.scheme() {
            "http" | "https" => match self.client.get(parsed).send() {
                Ok(_) => true,
                Err(e) => {
                    log::debug!("{} unreachable: {}", url, e);
                    false
                }
            },
            "tcp" => self.tcp_reachable(&parsed),
            scheme => {
                log::debug!("unsupported scheme {} for {}", scheme, url);
                false
            }
        };
        log::trace!("{} reachable: {}", url, reachable);
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_http_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            /* the status code is not evaluated */
            stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .unwrap();
        });

        let probe = NetProbe::new(Duration::from_secs(5)).unwrap();
        assert!(probe.is_reachable(&format!("http://127.0.0.1:{}/config", port)));
        server.join().unwrap();
    }

    #[test]
    fn test_tcp_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = NetProbe::new(Duration::from_secs(1)).unwrap();
        assert!(probe.is_reachable(&format!("tcp://127.0.0.1:{}", port)));
        drop(listener);
    }

    #[test]
    fn test_unreachable() {
        let probe = NetProbe::new(Duration::from_secs(1)).unwrap();
        let port = closed_port();

        assert!(!probe.is_reachable(&format!("http://127.0.0.1:{}/config", port)));
        assert!(!probe.is_reachable(&format!("tcp://127.0.0.1:{}", port)));
        assert!(!probe.is_reachable("tcp://127.0.0.1"));
        assert!(!probe.is_reachable("ftp://127.0.0.1:21"));
        assert!(!probe.is_reachable("not a url"));
    }
}
