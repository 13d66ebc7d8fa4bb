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

//! unitprobe command line

use clap::Parser;
use constants::LOG_FILE_PATH;
use std::process::exit;
use std::rc::Rc;
use unitprobe::scenario::{Scenario, CATALOGUE};
use unitprobe::systemctl::Systemctl;
use unitprobe::unit_env::{DirectEditor, FileEditor, SedEditor};
use unitprobe::{Error, ProbeConfig, Result, ScenarioRunner, SignerBackend, UnitEnvEditor};

/// parse program arguments
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Scenario or operation to run
    #[clap(subcommand)]
    subcmd: SubCmd,

    /// Configuration file, instead of $UNITPROBE_CONFIG or the default path
    #[clap(short, long)]
    config: Option<String>,

    /// Log level, overrides the configured one
    #[clap(short, long)]
    log_level: Option<String>,
}

#[derive(Parser, Debug)]
enum SubCmd {
    /// `[scenario]` Check the node service of a network
    #[clap(display_order = 1)]
    Node {
        #[clap(required = true)]
        network: String,
    },

    /// `[scenario]` Check the baking service of a network and its bakers
    #[clap(display_order = 2)]
    Baking {
        #[clap(required = true)]
        network: String,
        #[clap(required = true)]
        protocols: Vec<String>,
    },

    /// `[scenario]` Check a signer service and sign through it
    #[clap(display_order = 3)]
    Signer {
        #[clap(required = true)]
        backend: String,
    },

    /// `[scenario]` Check a standalone accuser on top of a node
    #[clap(display_order = 4)]
    Accuser {
        #[clap(required = true)]
        network: String,
        #[clap(required = true)]
        protocol: String,
    },

    /// `[scenario]` Run one or more stock scenarios by name
    #[clap(display_order = 5)]
    Run {
        #[clap(required = true)]
        scenarios: Vec<String>,
    },

    /// `[scenario]` List the stock scenarios
    #[clap(display_order = 6)]
    List {},

    /// `[unit]` Show the active state of a unit
    #[clap(display_order = 7)]
    State {
        #[clap(required = true)]
        unit: String,
    },

    /// `[unit]` Change an Environment assignment of a unit file and reload
    #[clap(display_order = 8)]
    SetEnv {
        #[clap(required = true)]
        unit: String,
        #[clap(required = true)]
        key: String,
        #[clap(required = true)]
        value: String,
    },

    /// `[endpoint]` Check that an http, https or tcp endpoint answers
    #[clap(display_order = 9)]
    Probe {
        #[clap(required = true)]
        url: String,
    },
}

fn init_logger(config: &ProbeConfig, level: Option<&str>) {
    let level = level.unwrap_or(&config.Log.Level);
    let level = log::parse_level(level).unwrap_or(log::Level::Info);
    let targets: Vec<&str> = config
        .Log
        .Target
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    let file = match config.Log.File.trim() {
        "" => LOG_FILE_PATH,
        f => f,
    };
    log::init_log("unitprobe", level, targets, file);
}

fn run_scenarios(config: &ProbeConfig, scenarios: &[Scenario]) -> Result<()> {
    let runner = ScenarioRunner::from_config(config)?;
    let mut failed = None;
    for s in scenarios {
        let ret = runner.run(s);
        println!("{:<24} {}", s.to_string(), if ret.is_ok() { "ok" } else { "FAILED" });
        if let Err(e) = ret {
            failed.get_or_insert(e);
        }
    }
    match failed {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn execute(args: Args, config: &ProbeConfig) -> Result<()> {
    match args.subcmd {
        SubCmd::Node { network } => run_scenarios(config, &[Scenario::Node { network }]),
        SubCmd::Baking { network, protocols } => {
            run_scenarios(config, &[Scenario::Baking { network, protocols }])
        }
        SubCmd::Signer { backend } => {
            let backend: SignerBackend = backend.parse()?;
            run_scenarios(config, &[Scenario::Signer { backend }])
        }
        SubCmd::Accuser { network, protocol } => {
            run_scenarios(config, &[Scenario::Accuser { network, protocol }])
        }
        SubCmd::Run { scenarios } => {
            let scenarios = scenarios
                .iter()
                .map(|name| Scenario::by_name(name))
                .collect::<Result<Vec<_>>>()?;
            run_scenarios(config, &scenarios)
        }
        SubCmd::List {} => {
            for name in CATALOGUE {
                let s = Scenario::by_name(name)?;
                println!("{:<24} {}", name, s);
            }
            Ok(())
        }
        SubCmd::State { unit } => {
            let unit = basic::unit_name::unit_name_mangle(&unit)
                .map_err(|_| Error::InvalidUnitName { what: unit.clone() })?;
            let state = ScenarioRunner::from_config(config)?.checker().state(&unit)?;
            println!("{}", state);
            Ok(())
        }
        SubCmd::SetEnv { unit, key, value } => {
            let manager = Rc::new(Systemctl::from_config(config));
            let editor: Box<dyn FileEditor> = if config.Tezos.EditWithSudo {
                Box::new(SedEditor::new(true))
            } else {
                Box::new(DirectEditor)
            };
            match UnitEnvEditor::new(manager, editor).set_environment_variable(&unit, &key, &value)? {
                Some(edit) => {
                    println!(
                        "{}: {} {} -> {}",
                        edit.path.display(),
                        edit.key,
                        edit.old_value,
                        edit.new_value
                    );
                    Ok(())
                }
                None => {
                    println!("{} has no {} assignment, nothing changed", unit, key);
                    Ok(())
                }
            }
        }
        SubCmd::Probe { url } => {
            let runner = ScenarioRunner::from_config(config)?;
            runner.checker().assert_endpoint_reachable(&url)?;
            println!("{} reachable", url);
            Ok(())
        }
    }
}

fn main() {
    let args = Args::parse();

    let config = match ProbeConfig::new(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            exit(e.get_errno());
        }
    };
    init_logger(&config, args.log_level.as_deref());

    if let Err(e) = execute(args, &config) {
        log::error!("{}", e);
        eprintln!("{}", e);
        exit(e.get_errno());
    }
}
