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

//! The service manager boundary: everything unitprobe asks of the
//! supervision daemon goes through [`UnitManager`].
use std::fmt;
use std::path::PathBuf;

use crate::error::*;
use crate::state::{UnitActiveState, UnitFileState};

/// How a queued job for the same unit is treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JobMode {
    /// supersede any existing queued job for the unit
    #[default]
    Replace,
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobMode::Replace => write!(f, "replace"),
        }
    }
}

/// One unit file known to the service manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitFileEntry {
    /// path of the unit definition on disk
    pub path: PathBuf,
    /// enablement state of the file
    pub state: UnitFileState,
}

/// Operations required from the supervision daemon.
pub trait UnitManager {
    /// queue a start job for `unit`
    fn start_unit(&self, unit: &str, mode: JobMode) -> Result<()>;

    /// queue a stop job for `unit`; stopping an inactive unit succeeds
    fn stop_unit(&self, unit: &str, mode: JobMode) -> Result<()>;

    /// read the current active state, never cached
    fn active_state(&self, unit: &str) -> Result<UnitActiveState>;

    /// unit files whose name matches one of the glob `patterns` and whose
    /// state is one of `states`
    fn list_unit_files(
        &self,
        states: &[UnitFileState],
        patterns: &[&str],
    ) -> Result<Vec<UnitFileEntry>>;

    /// reload all unit definitions from disk
    fn daemon_reload(&self) -> Result<()>;
}

/// Match a unit file name against a glob pattern the way the manager does.
pub fn unit_pattern_matches(pattern: &str, name: &str) -> bool {
    match fnmatch_regex::glob_to_regex(pattern) {
        Ok(re) => re.is_match(name),
        Err(_) => pattern == name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_mode() {
        assert_eq!(JobMode::default(), JobMode::Replace);
        assert_eq!(JobMode::Replace.to_string(), "replace");
    }

    #[test]
    fn test_unit_pattern_matches() {
        assert!(unit_pattern_matches(
            "tezos-node-mainnet.service",
            "tezos-node-mainnet.service"
        ));
        assert!(unit_pattern_matches("tezos-node-*.service", "tezos-node-mainnet.service"));
        assert!(!unit_pattern_matches(
            "tezos-node-*.service",
            "tezos-baking-mainnet.service"
        ));
        assert!(unit_pattern_matches(
            "tezos-baker-*@mainnet.service",
            "tezos-baker-013-ptjakart@mainnet.service"
        ));
    }
}
