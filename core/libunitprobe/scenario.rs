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

//! End-to-end checks of the packaged tezos services.
use basic::unit_name::{unit_name_build_instance, unit_name_mangle};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::checker::Checker;
use crate::config::ProbeConfig;
use crate::endpoint::NetProbe;
use crate::error::*;
use crate::lifecycle::ServiceLifecycle;
use crate::process::ProcFs;
use crate::retry::ThreadSleeper;
use crate::systemctl::Systemctl;
use crate::tools::{CommandRunner, TezosTools};

/// protocol exercised by the stock scenarios
pub const DEFAULT_PROTOCOL: &str = "013-PtJakart";

fn mangle(name: String) -> Result<String> {
    unit_name_mangle(&name).map_err(|_| Error::InvalidUnitName { what: name })
}

/// `tezos-node-<network>.service`
pub fn node_unit(network: &str) -> Result<String> {
    mangle(format!("tezos-node-{}", network))
}

/// `tezos-baking-<network>.service`
pub fn baking_unit(network: &str) -> Result<String> {
    mangle(format!("tezos-baking-{}", network))
}

/// `tezos-baker-<protocol>@<network>.service`, protocol lowercased
pub fn baker_unit(protocol: &str, network: &str) -> Result<String> {
    let prefix = format!("tezos-baker-{}", protocol.to_lowercase());
    unit_name_build_instance(&prefix, network).map_err(|_| Error::InvalidUnitName {
        what: format!("{}@{}", prefix, network),
    })
}

/// `tezos-accuser-<protocol>.service`, protocol lowercased
pub fn accuser_unit(protocol: &str) -> Result<String> {
    mangle(format!("tezos-accuser-{}", protocol.to_lowercase()))
}

/// `tezos-signer-<backend>.service`
pub fn signer_unit(backend: SignerBackend) -> Result<String> {
    mangle(format!("tezos-signer-{}", backend))
}

/// Transport served by a packaged signer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignerBackend {
    ///
    Http,
    ///
    Tcp,
}

impl SignerBackend {
    /// where the signer of this backend listens
    pub fn url(&self) -> &'static str {
        match self {
            SignerBackend::Http => "http://localhost:8080",
            SignerBackend::Tcp => "tcp://localhost:8000",
        }
    }
}

impl fmt::Display for SignerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerBackend::Http => write!(f, "http"),
            SignerBackend::Tcp => write!(f, "tcp"),
        }
    }
}

impl FromStr for SignerBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(SignerBackend::Http),
            "tcp" => Ok(SignerBackend::Tcp),
            _ => Err(Error::UnknownScenario {
                name: format!("signer-{}", s),
            }),
        }
    }
}

/// One verification flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scenario {
    ///
    Node { network: String },
    ///
    Baking {
        network: String,
        protocols: Vec<String>,
    },
    ///
    Signer { backend: SignerBackend },
    ///
    Accuser { network: String, protocol: String },
}

/// names of the stock scenarios, in run order
pub const CATALOGUE: &[&str] = &[
    "node-mainnet",
    "node-jakartanet",
    "baking-jakartanet",
    "baking-mainnet",
    "signer-http",
    "signer-tcp",
    "accuser-jakartanet",
];

impl Scenario {
    /// Look up a stock scenario by name.
    pub fn by_name(name: &str) -> Result<Scenario> {
        let unknown = || Error::UnknownScenario {
            name: name.to_string(),
        };
        if !CATALOGUE.contains(&name) {
            return Err(unknown());
        }
        let (kind, arg) = name.split_once('-').ok_or_else(unknown)?;

        let scenario = match kind {
            "node" => Scenario::Node {
                network: arg.to_string(),
            },
            "baking" => Scenario::Baking {
                network: arg.to_string(),
                protocols: vec![DEFAULT_PROTOCOL.to_string()],
            },
            "signer" => Scenario::Signer {
                backend: arg.parse()?,
            },
            "accuser" => Scenario::Accuser {
                network: arg.to_string(),
                protocol: DEFAULT_PROTOCOL.to_string(),
            },
            _ => return Err(unknown()),
        };
        Ok(scenario)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Node { network } => write!(f, "node-{}", network),
            Scenario::Baking { network, protocols } => {
                write!(f, "baking-{} [{}]", network, protocols.join(", "))
            }
            Scenario::Signer { backend } => write!(f, "signer-{}", backend),
            Scenario::Accuser { network, protocol } => {
                write!(f, "accuser-{} [{}]", network, protocol)
            }
        }
    }
}

/// Runs scenarios against one set of collaborators.
pub struct ScenarioRunner {
    lifecycle: ServiceLifecycle,
    checker: Checker,
    tools: TezosTools,
    node_rpc: String,
}

impl ScenarioRunner {
    ///
    pub fn new(
        lifecycle: ServiceLifecycle,
        checker: Checker,
        tools: TezosTools,
        node_rpc: &str,
    ) -> Self {
        ScenarioRunner {
            lifecycle,
            checker,
            tools,
            node_rpc: node_rpc.trim_end_matches('/').to_string(),
        }
    }

    /// The production wiring: systemctl, /proc, real network and real tools.
    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        let manager = Rc::new(Systemctl::from_config(config));
        let sleeper = Rc::new(ThreadSleeper);
        let probe = Rc::new(NetProbe::new(config.endpoint_timeout())?);

        let lifecycle =
            ServiceLifecycle::new(manager.clone(), sleeper.clone(), config.lifecycle_options());
        let checker = Checker::new(
            manager,
            Rc::new(ProcFs),
            probe,
            sleeper,
            config.retry_policy(),
        );
        let tools = TezosTools::from_config(Rc::new(CommandRunner), config);

        Ok(ScenarioRunner::new(
            lifecycle,
            checker,
            tools,
            &config.Tezos.NodeRpc,
        ))
    }

    ///
    pub fn lifecycle(&self) -> &ServiceLifecycle {
        &self.lifecycle
    }

    ///
    pub fn checker(&self) -> &Checker {
        &self.checker
    }

    ///
    pub fn run(&self, scenario: &Scenario) -> Result<()> {
        log::info!("running scenario {}", scenario);
        let ret = match scenario {
            Scenario::Node { network } => self.node_service_test(network),
            Scenario::Baking { network, protocols } => {
                self.baking_service_test(network, protocols)
            }
            Scenario::Signer { backend } => self.signer_service_test(*backend),
            Scenario::Accuser { network, protocol } => {
                self.standalone_accuser_test(network, protocol)
            }
        };
        match &ret {
            Ok(()) => log::info!("scenario {} passed", scenario),
            Err(e) => log::error!("scenario {} failed: {}", scenario, e),
        }
        ret
    }

    /// The node unit runs `tezos-node` and answers RPC requests.
    pub fn node_service_test(&self, network: &str) -> Result<()> {
        let unit = node_unit(network)?;
        let config_url = format!("{}/config", self.node_rpc);

        self.lifecycle.with_service(&unit, |_| {
            self.checker.assert_process_running("tezos-node")?;
            self.checker.assert_endpoint_reachable(&config_url)
        })
    }

    /// The baking unit brings up the node and one baker per protocol.
    pub fn baking_service_test<S: AsRef<str>>(&self, network: &str, protocols: &[S]) -> Result<()> {
        self.tools.gen_baker_key()?;

        let unit = baking_unit(network)?;
        let node = node_unit(network)?;
        self.lifecycle.with_service(&unit, |_| {
            self.checker.assert_service_active(&node)?;
            self.checker.assert_process_running("tezos-node")?;
            for protocol in protocols {
                let protocol = protocol.as_ref();
                self.checker
                    .assert_service_active(&baker_unit(protocol, network)?)?;
                self.checker
                    .assert_process_running(&format!("tezos-baker-{}", protocol))?;
            }
            Ok(())
        })
    }

    /// The signer unit runs `tezos-signer` and signs for an imported remote key.
    pub fn signer_service_test(&self, backend: SignerBackend) -> Result<()> {
        let unit = signer_unit(backend)?;

        self.lifecycle.with_service(&unit, |_| {
            self.checker.assert_process_running("tezos-signer")?;
            self.tools.gen_signer_key("remote")?;
            let address = self.tools.signer_key_address("remote")?;
            self.tools.import_remote_key(backend.url(), &address)?;
            self.tools.sign_with_remote()
        })
    }

    /// An accuser started on top of a running node.
    pub fn standalone_accuser_test(&self, network: &str, protocol: &str) -> Result<()> {
        let node = node_unit(network)?;
        let accuser = accuser_unit(protocol)?;

        self.lifecycle.with_service(&node, |_| {
            self.lifecycle.with_service(&accuser, |_| {
                self.checker
                    .assert_process_running(&format!("tezos-accuser-{}", protocol))
            })
        })
    }
}
