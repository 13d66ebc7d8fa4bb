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

//! Harness configuration, loaded from a TOML file with environment overrides.
#![allow(non_snake_case)]
use confique::Config;
use constants::{CONFIG_FILE_ENV, CONFIG_FILE_PATH};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::*;
use crate::lifecycle::LifecycleOptions;
use crate::retry::RetryPolicy;

#[derive(Config, Debug)]
pub struct ProbeConfig {
    #[config(nested)]
    pub Retry: SectionRetry,
    #[config(nested)]
    pub Lifecycle: SectionLifecycle,
    #[config(nested)]
    pub Manager: SectionManager,
    #[config(nested)]
    pub Endpoint: SectionEndpoint,
    #[config(nested)]
    pub Log: SectionLog,
    #[config(nested)]
    pub Tezos: SectionTezos,
}

#[derive(Config, Debug)]
pub struct SectionRetry {
    #[config(default = 10)]
    pub Attempts: u32,
    #[config(default = 1)]
    pub DelaySec: u64,
}

#[derive(Config, Debug)]
pub struct SectionLifecycle {
    #[config(default = 1000)]
    pub PollIntervalMs: u64,
    #[config(default = 5)]
    pub SettleSec: u64,
    #[config(default = 300)]
    pub StartTimeoutSec: u64,
    #[config(default = 120)]
    pub StopTimeoutSec: u64,
}

#[derive(Config, Debug)]
pub struct SectionManager {
    #[config(default = "systemctl")]
    pub Systemctl: String,
    #[config(env = "UNITPROBE_SUDO")]
    #[config(default = false)]
    pub Sudo: bool,
    #[config(default = false)]
    pub User: bool,
}

#[derive(Config, Debug)]
pub struct SectionEndpoint {
    #[config(default = 5)]
    pub TimeoutSec: u64,
}

#[derive(Config, Debug)]
pub struct SectionLog {
    #[config(env = "UNITPROBE_LOG_LEVEL")]
    #[config(default = "info")]
    pub Level: String,
    #[config(default = "console")]
    pub Target: String,
    #[config(default = "/var/log/unitprobe/unitprobe.log")]
    pub File: String,
}

#[derive(Config, Debug)]
pub struct SectionTezos {
    #[config(default = "tezos")]
    pub ServiceUser: String,
    #[config(default = "/var/lib/tezos/signer")]
    pub SignerDir: String,
    #[config(env = "UNITPROBE_NODE_RPC")]
    #[config(default = "http://localhost:8732")]
    pub NodeRpc: String,
    #[config(default = true)]
    pub EditWithSudo: bool,
}

impl ProbeConfig {
    /// Load the configuration from `file`, which must exist and be valid.
    /// Without `file`, `$UNITPROBE_CONFIG` or the default path is tried and
    /// an unreadable or invalid file falls back to the built-in defaults.
    pub fn new(file: Option<&str>) -> Result<ProbeConfig> {
        if let Some(f) = file {
            return Self::load(f);
        }

        let path = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| CONFIG_FILE_PATH.to_string());
        Self::load_or_defaults(&path)
    }

    /// Strict load of `path` with environment overrides.
    pub fn load(path: &str) -> Result<ProbeConfig> {
        fs::metadata(path).context(IoSnafu)?;
        ProbeConfig::builder()
            .env()
            .file(path)
            .load()
            .context(ConfiqueSnafu)
    }

    fn load_or_defaults(path: &str) -> Result<ProbeConfig> {
        if !Path::new(path).exists() {
            return ProbeConfig::builder().env().load().context(ConfiqueSnafu);
        }
        match Self::load(path) {
            Ok(c) => Ok(c),
            Err(e) => {
                /* the logger is set up from this configuration, so it is not there yet */
                eprintln!("failed to load {}: {}, using defaults", path, e);
                Self::defaults()
            }
        }
    }

    /// The built-in defaults, no file and no environment involved.
    pub fn defaults() -> Result<ProbeConfig> {
        ProbeConfig::builder().load().context(ConfiqueSnafu)
    }

    /// retry policy used by every liveness check
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.Retry.Attempts, Duration::from_secs(self.Retry.DelaySec))
    }

    /// polling and settle parameters of scoped unit acquisitions
    pub fn lifecycle_options(&self) -> LifecycleOptions {
        LifecycleOptions {
            poll_interval: Duration::from_millis(self.Lifecycle.PollIntervalMs),
            settle: Duration::from_secs(self.Lifecycle.SettleSec),
            start_timeout: Duration::from_secs(self.Lifecycle.StartTimeoutSec),
            stop_timeout: Duration::from_secs(self.Lifecycle.StopTimeoutSec),
        }
    }

    /// timeout of a single endpoint probe
    pub fn endpoint_timeout(&self) -> Duration {
        Duration::from_secs(self.Endpoint.TimeoutSec)
    }
}
