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

//! Command-line tools used by the scenarios. Tool output is only a
//! pass/fail signal, except for the address printed by `show address`.
use basic::exec_util;
use std::rc::Rc;

use crate::config::ProbeConfig;
use crate::error::*;

/// Runs one command line to completion.
pub trait ToolRunner {
    /// stdout of the command; a non-zero exit is [`Error::Tool`]
    fn run(&self, argv: &[String]) -> Result<String>;
}

/// Runs tools as child processes.
#[derive(Default, Clone, Copy, Debug)]
pub struct CommandRunner;

impl ToolRunner for CommandRunner {
    fn run(&self, argv: &[String]) -> Result<String> {
        exec_util::exec_output(argv).map_err(|e| match e {
            basic::Error::Exec {
                cmd,
                status,
                stderr,
            } => Error::Tool {
                cmd,
                status,
                stderr,
            },
            source => Error::Util { source },
        })
    }
}

/// Address of a key as printed by `tezos-client show address`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyAddress {
    /// public key hash, e.g. tz1...
    pub hash: String,
    /// public key, when printed
    pub public_key: Option<String>,
}

/// Parse the `Hash:` and `Public Key:` lines of `show address` output.
pub fn parse_key_address(output: &str) -> Option<KeyAddress> {
    let mut hash = None;
    let mut public_key = None;
    for line in output.lines() {
        let line = line.trim();
        if let Some(v) = line.strip_prefix("Hash:") {
            hash = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("Public Key:") {
            public_key = Some(v.trim().to_string());
        }
    }

    hash.filter(|h| !h.is_empty())
        .map(|hash| KeyAddress { hash, public_key })
}

fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// The tezos-client / tezos-signer invocations of the scenarios.
pub struct TezosTools {
    runner: Rc<dyn ToolRunner>,
    user: String,
    signer_dir: String,
}

impl TezosTools {
    ///
    pub fn new(runner: Rc<dyn ToolRunner>, user: &str, signer_dir: &str) -> Self {
        TezosTools {
            runner,
            user: user.to_string(),
            signer_dir: signer_dir.to_string(),
        }
    }

    ///
    pub fn from_config(runner: Rc<dyn ToolRunner>, config: &ProbeConfig) -> Self {
        TezosTools::new(runner, &config.Tezos.ServiceUser, &config.Tezos.SignerDir)
    }

    fn run_as_service_user(&self, args: &[&str]) -> Result<String> {
        let mut full = argv(&["sudo", "-u", self.user.as_str()]);
        full.extend(argv(args));
        self.runner.run(&full)
    }

    /// generate (or overwrite) the "baker" key of the service user
    pub fn gen_baker_key(&self) -> Result<()> {
        self.run_as_service_user(&["tezos-client", "gen", "keys", "baker", "--force"])?;
        Ok(())
    }

    /// generate (or overwrite) the "remote" key in the signer data directory
    pub fn gen_signer_key(&self, alias: &str) -> Result<()> {
        self.run_as_service_user(&[
            "tezos-signer",
            "-d",
            self.signer_dir.as_str(),
            "gen",
            "keys",
            alias,
            "--force",
        ])?;
        Ok(())
    }

    /// address of `alias` in the signer data directory
    pub fn signer_key_address(&self, alias: &str) -> Result<KeyAddress> {
        let out = self.run_as_service_user(&[
            "tezos-client",
            "-d",
            self.signer_dir.as_str(),
            "show",
            "address",
            alias,
        ])?;
        parse_key_address(&out).ok_or_else(|| Error::KeyAddress {
            alias: alias.to_string(),
        })
    }

    /// register `<backend>/<hash>` as the "remote-signer" secret key
    pub fn import_remote_key(&self, backend: &str, address: &KeyAddress) -> Result<()> {
        let uri = format!("{}/{}", backend.trim_end_matches('/'), address.hash);
        self.runner.run(&argv(&[
            "tezos-client",
            "import",
            "secret",
            "key",
            "remote-signer",
            uri.as_str(),
            "--force",
        ]))?;
        Ok(())
    }

    /// sign a fixed payload with the remote signer in mockup mode
    pub fn sign_with_remote(&self) -> Result<()> {
        self.runner.run(&argv(&[
            "tezos-client",
            "--mode",
            "mockup",
            "sign",
            "bytes",
            "0x1234",
            "for",
            "remote-signer",
        ]))?;
        Ok(())
    }
}
