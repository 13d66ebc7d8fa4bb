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

//! [`UnitManager`] implemented on top of the `systemctl` executable.
use basic::exec_util;
use std::path::PathBuf;

use crate::config::ProbeConfig;
use crate::error::*;
use crate::manager::{unit_pattern_matches, JobMode, UnitFileEntry, UnitManager};
use crate::state::{UnitActiveState, UnitFileState};

/// Drives systemd through `systemctl`, optionally via sudo or on the user manager.
#[derive(Clone, Debug)]
pub struct Systemctl {
    program: String,
    sudo: bool,
    user: bool,
}

impl Systemctl {
    ///
    pub fn new(program: &str, sudo: bool, user: bool) -> Self {
        Systemctl {
            program: program.to_string(),
            sudo,
            user,
        }
    }

    ///
    pub fn from_config(config: &ProbeConfig) -> Self {
        Systemctl::new(
            &config.Manager.Systemctl,
            config.Manager.Sudo,
            config.Manager.User,
        )
    }

    /// full command line for a systemctl invocation
    pub fn argv(&self, args: &[&str]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 3);
        if self.sudo {
            argv.push("sudo".to_string());
        }
        argv.push(self.program.clone());
        if self.user {
            argv.push("--user".to_string());
        }
        argv.extend(args.iter().map(|s| s.to_string()));
        argv
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let argv = self.argv(args);
        exec_util::exec_output(&argv).map_err(|e| match e {
            basic::Error::Exec {
                cmd,
                status,
                stderr,
            } => Error::Manager {
                cmd,
                status,
                stderr,
            },
            source => Error::Util { source },
        })
    }

    fn fragment_path(&self, unit: &str) -> Result<Option<PathBuf>> {
        let out = self.run(&["show", "-p", "FragmentPath", "--value", unit])?;
        let path = out.trim();
        if path.is_empty() {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(path)))
    }
}

/// Parse `list-unit-files --no-legend` output into (name, state) pairs.
pub fn parse_unit_files(output: &str) -> Vec<(String, UnitFileState)> {
    output
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let name = cols.next()?;
            let state = cols.next()?;
            Some((name.to_string(), UnitFileState::from(state)))
        })
        .collect()
}

/// Start and stop only enqueue the job; the outcome is left to state polling.
impl UnitManager for Systemctl {
    fn start_unit(&self, unit: &str, mode: JobMode) -> Result<()> {
        let mode = format!("--job-mode={}", mode);
        log::debug!("starting {} ({})", unit, mode);
        self.run(&["start", "--no-block", mode.as_str(), unit]).map(|_| ())
    }

    fn stop_unit(&self, unit: &str, mode: JobMode) -> Result<()> {
        let mode = format!("--job-mode={}", mode);
        log::debug!("stopping {} ({})", unit, mode);
        self.run(&["stop", "--no-block", mode.as_str(), unit]).map(|_| ())
    }

    fn active_state(&self, unit: &str) -> Result<UnitActiveState> {
        let out = self.run(&["show", "-p", "ActiveState", "--value", unit])?;
        let state = out.parse::<UnitActiveState>().unwrap_or(UnitActiveState::Unknown);
        log::trace!("{} is {}", unit, state);
        Ok(state)
    }

    fn list_unit_files(
        &self,
        states: &[UnitFileState],
        patterns: &[&str],
    ) -> Result<Vec<UnitFileEntry>> {
        let state_filter = format!(
            "--state={}",
            states
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<&str>>()
                .join(",")
        );
        let mut args = vec!["list-unit-files", "--no-legend", "--no-pager", state_filter.as_str()];
        args.extend_from_slice(patterns);
        let out = self.run(&args)?;

        let mut entries = Vec::new();
        for (name, state) in parse_unit_files(&out) {
            if !states.contains(&state)
                || !(patterns.is_empty() || patterns.iter().any(|p| unit_pattern_matches(p, &name)))
            {
                continue;
            }
            match self.fragment_path(&name)? {
                Some(path) => entries.push(UnitFileEntry { path, state }),
                None => log::debug!("{} has no fragment path, skipping", name),
            }
        }
        Ok(entries)
    }

    fn daemon_reload(&self) -> Result<()> {
        log::debug!("reloading unit definitions");
        self.run(&["daemon-reload"]).map(|_| ())
    }
}
