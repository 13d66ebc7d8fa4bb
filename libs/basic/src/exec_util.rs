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

//! Run external commands and collect their output.

use crate::error::*;
use std::process::Command;

/// Render an argv vector the way it would be typed in a shell, for logs and errors.
pub fn argv_to_string<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Run `argv[0]` with the remaining arguments and return its stdout.
///
/// A non-zero exit status is reported as [`Error::Exec`] carrying the
/// command line, the status and the captured stderr.
pub fn exec_output<S: AsRef<str>>(argv: &[S]) -> Result<String> {
    let (program, args) = match argv.split_first() {
        Some(v) => v,
        None => {
            return Err(Error::Invalid {
                what: "empty command line".to_string(),
            })
        }
    };

    let cmd = argv_to_string(argv);
    log::debug!("executing: {}", cmd);

    let output = Command::new(program.as_ref())
        .args(args.iter().map(|s| s.as_ref()))
        .output()
        .context(IoSnafu)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        log::debug!("'{}' failed with {}: {}", cmd, output.status, stderr);
        return Err(Error::Exec {
            cmd,
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(String::from_utf8(output.stdout)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_output() {
        let out = exec_output(&["echo", "hello", "tezos"]).unwrap();
        assert_eq!(out, "hello tezos\n");
    }

    #[test]
    fn test_exec_output_failure() {
        match exec_output(&["sh", "-c", "echo oops >&2; exit 3"]) {
            Err(Error::Exec { cmd, stderr, .. }) => {
                assert_eq!(cmd, "sh -c echo oops >&2; exit 3");
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let empty: [&str; 0] = [];
        assert!(exec_output(&empty).is_err());
        assert!(exec_output(&["/no/such/binary"]).is_err());
    }
}
