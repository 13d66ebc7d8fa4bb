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

//! Process table access.
use crate::error::*;

/// Source of the names of running processes.
pub trait ProcessTable {
    /// names of every process, read fresh on each call
    fn process_names(&self) -> Result<Vec<String>>;
}

/// The host process table read from /proc.
#[derive(Default, Clone, Copy, Debug)]
pub struct ProcFs;

impl ProcessTable for ProcFs {
    fn process_names(&self) -> Result<Vec<String>> {
        Ok(basic::process::process_names()?)
    }
}

/// True iff some process in `table` is named exactly `name`.
pub fn is_process_running(table: &dyn ProcessTable, name: &str) -> Result<bool> {
    let running = table.process_names()?.iter().any(|n| n == name);
    log::trace!("process {} running: {}", name, running);
    Ok(running)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeProcessTable;

    #[test]
    fn test_is_process_running_exact_match() {
        let table = FakeProcessTable::new(&["systemd", "tezos-node", "tezos-baker-013-PtJakart"]);
        assert!(is_process_running(&table, "tezos-node").unwrap());
        assert!(is_process_running(&table, "tezos-baker-013-PtJakart").unwrap());
        assert!(!is_process_running(&table, "tezos").unwrap());
        assert!(!is_process_running(&table, "tezos-node-mainnet").unwrap());
    }

    #[test]
    fn test_procfs_sees_init() {
        let names = ProcFs.process_names().unwrap();
        assert!(!names.is_empty());
    }
}
