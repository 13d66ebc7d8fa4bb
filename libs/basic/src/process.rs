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

//! process table functions
use crate::error::*;
use std::path::Path;

/// The kernel truncates `comm` to this many bytes (TASK_COMM_LEN minus the nul byte).
const COMM_MAX_LEN: usize = 15;

/// Resolve the name of a process from its `comm` field and its command line.
///
/// `comm` is truncated by the kernel, so a process started as
/// `tezos-baker-013-PtJakart` reports `tezos-baker-013`. When `comm` has
/// been cut and the basename of `argv[0]` extends it, the basename wins.
pub fn process_name(comm: &str, cmdline: &[String]) -> String {
    if comm.len() >= COMM_MAX_LEN {
        if let Some(arg0) = cmdline.first() {
            let base = Path::new(arg0)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(arg0);
            if base.starts_with(comm) {
                return base.to_string();
            }
        }
    }

    comm.to_string()
}

/// List the names of all processes in the current process table.
///
/// The table is read fresh on every call. Processes exiting while the table
/// is walked keep their `comm` name.
pub fn process_names() -> Result<Vec<String>> {
    let processes = procfs::process::all_processes().context(ProcSnafu)?;

    let mut names = Vec::with_capacity(processes.len());
    for process in processes {
        let comm = &process.stat.comm;
        let cmdline = if comm.len() >= COMM_MAX_LEN {
            process.cmdline().unwrap_or_default()
        } else {
            Vec::new()
        };
        names.push(process_name(comm, &cmdline));
    }

    Ok(names)
}
