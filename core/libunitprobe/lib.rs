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

//! Harness driving systemd units of the tezos packages through their lifecycle
//! and checking what they bring up.
pub mod checker;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod process;
pub mod retry;
pub mod scenario;
pub mod state;
pub mod systemctl;
pub mod tools;
pub mod unit_env;

#[cfg(test)]
mod testutil;

pub use checker::Checker;
pub use config::ProbeConfig;
pub use error::*;
pub use lifecycle::{LifecycleOptions, ScopeReport, ServiceHandle, ServiceLifecycle};
pub use manager::{JobMode, UnitManager};
pub use retry::{RetryPolicy, Sleeper};
pub use scenario::{Scenario, ScenarioRunner, SignerBackend};
pub use state::{UnitActiveState, UnitFileState};
pub use unit_env::{ConfigFileEdit, UnitEnvEditor};
