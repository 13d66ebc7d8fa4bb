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

//! This crate provides common functions and fixtures for unitprobe tests
use std::{
    env, fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// A unit definition shaped like the ones shipped by the tezos packages.
pub const NODE_UNIT: &str = r#"[Unit]
Description=Tezos node mainnet
After=network.target

[Service]
EnvironmentFile=-/etc/default/tezos-node-mainnet
Environment="CERT_PATH="
Environment="KEY_PATH="
Environment="NODE_RPC_ADDR=127.0.0.1:8732"
Environment="NODE_DATA_DIR=/var/lib/tezos/node-mainnet"
Environment="NETWORK=mainnet"
ExecStartPre=/usr/bin/tezos-node-prestart
ExecStart=/usr/bin/tezos-node-start
User=tezos
Restart=on-failure

[Install]
WantedBy=multi-user.target
"#;

/// get the source project root path, the first ancestor holding a Cargo.lock
pub fn get_project_root() -> io::Result<PathBuf> {
    let path = env::current_dir()?;

    for p in path.ancestors() {
        if p.join("Cargo.lock").is_file() {
            return Ok(p.into());
        }
    }

    Err(io::Error::new(ErrorKind::NotFound, "Cargo.lock not found"))
}

/// A unit file living in its own temporary directory.
///
/// The directory is removed when the fixture is dropped.
pub struct UnitFixture {
    dir: TempDir,
    path: PathBuf,
}

impl UnitFixture {
    /// Write `content` to `<tmpdir>/<name>`.
    pub fn new(name: &str, content: &str) -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(name);
        fs::write(&path, content)?;
        Ok(Self { dir, path })
    }

    /// A fixture holding [`NODE_UNIT`].
    pub fn node_unit() -> io::Result<Self> {
        Self::new("tezos-node-mainnet.service", NODE_UNIT)
    }

    /// path of the unit file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// directory holding the unit file
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// current content of the unit file
    pub fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    /// lines starting with `Environment=`, in file order
    pub fn environment_lines(&self) -> io::Result<Vec<String>> {
        Ok(self
            .read()?
            .lines()
            .filter(|l| l.trim_start().starts_with("Environment="))
            .map(|l| l.to_string())
            .collect())
    }
}
