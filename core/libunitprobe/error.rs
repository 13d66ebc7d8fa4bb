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

//! Error define. Each crate defines its own error.rs, inside unitprobe only
//! this Error is used. ConfigKeyNotFound is not an error: a missing
//! environment key is reported as `Ok(None)` by the unit file editor.

pub use nix::errno::Errno;
use snafu::prelude::*;
#[allow(unused_imports)]
pub use snafu::ResultExt;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::UnitActiveState;

#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("{} failed to start, state is {}", unit, state))]
    StartFailed {
        unit: String,
        state: UnitActiveState,
    },

    #[snafu(display("{} still activating after {:?}", unit, waited))]
    StartTimeout { unit: String, waited: Duration },

    #[snafu(display("{} did not stop after {:?}, state is {}", unit, waited, state))]
    StopTimeout {
        unit: String,
        waited: Duration,
        state: UnitActiveState,
    },

    #[snafu(display("check '{}' still false after {} attempts", what, attempts))]
    PredicateTimeout { what: String, attempts: u32 },

    #[snafu(display("no enabled or disabled unit file matches '{}'", unit))]
    UnitFileNotFound { unit: String },

    #[snafu(display("'{}' matches several unit files: {:?}", unit, paths))]
    AmbiguousUnitFile { unit: String, paths: Vec<PathBuf> },

    #[snafu(display("service manager command '{}' failed ({}): {}", cmd, status, stderr))]
    Manager {
        cmd: String,
        status: String,
        stderr: String,
    },

    #[snafu(display("tool '{}' failed ({}): {}", cmd, status, stderr))]
    Tool {
        cmd: String,
        status: String,
        stderr: String,
    },

    #[snafu(display("Invalid unit name: {}", what))]
    InvalidUnitName { what: String },

    #[snafu(display("{} still has its old {} assignment after the edit", path.display(), key))]
    EditNotApplied { path: PathBuf, key: String },

    #[snafu(display("invalid environment assignment {}={}", key, value))]
    InvalidEnvironment { key: String, value: String },

    #[snafu(display("no address found for key alias '{}'", alias))]
    KeyAddress { alias: String },

    #[snafu(display("unknown scenario '{}'", name))]
    UnknownScenario { name: String },

    #[snafu(display("UtilError(unitprobe): {}", source))]
    Util { source: basic::Error },

    #[snafu(display("IoError(unitprobe): {}", source))]
    Io { source: std::io::Error },

    #[snafu(display("Confique error: {}", source))]
    Confique { source: confique::Error },

    #[snafu(display("Regex error: {}", source))]
    Regex { source: regex::Error },

    #[snafu(display("Http client error: {}", source))]
    Http { source: reqwest::Error },
}

impl Error {
    /// Convert to the standard linux error code, used as the process exit status.
    pub fn get_errno(&self) -> i32 {
        let errno = match self {
            Error::StartFailed { .. } => Errno::EIO,
            Error::StartTimeout { .. } | Error::StopTimeout { .. } => Errno::ETIMEDOUT,
            Error::PredicateTimeout { .. } => Errno::ETIME,
            Error::UnitFileNotFound { .. } => Errno::ENOENT,
            Error::AmbiguousUnitFile { .. } => Errno::ENOTUNIQ,
            Error::Manager { .. } | Error::Tool { .. } => Errno::ECHILD,
            Error::InvalidUnitName { .. } => Errno::EINVAL,
            Error::EditNotApplied { .. } => Errno::EIO,
            Error::InvalidEnvironment { .. } => Errno::EINVAL,
            Error::KeyAddress { .. } => Errno::ENOKEY,
            Error::UnknownScenario { .. } => Errno::EINVAL,
            Error::Util { source } => return source.get_errno(),
            Error::Io { source } => return source.raw_os_error().unwrap_or(Errno::EIO as i32),
            Error::Confique { .. } => Errno::EINVAL,
            Error::Regex { .. } => Errno::EINVAL,
            Error::Http { .. } => Errno::EIO,
        };
        errno as i32
    }
}

impl From<basic::Error> for Error {
    fn from(source: basic::Error) -> Self {
        Error::Util { source }
    }
}

/// new Result
pub type Result<T, E = Error> = std::result::Result<T, E>;
