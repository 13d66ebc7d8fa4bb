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

//! Liveness checks wrapped in the retry policy.
use std::rc::Rc;

use crate::endpoint::Probe;
use crate::error::*;
use crate::manager::UnitManager;
use crate::process::{is_process_running, ProcessTable};
use crate::retry::{ensure, retry, RetryPolicy, Sleeper};
use crate::state::UnitActiveState;

/// Answers "is X up" questions, tolerating a short convergence window.
pub struct Checker {
    manager: Rc<dyn UnitManager>,
    processes: Rc<dyn ProcessTable>,
    probe: Rc<dyn Probe>,
    sleeper: Rc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl Checker {
    ///
    pub fn new(
        manager: Rc<dyn UnitManager>,
        processes: Rc<dyn ProcessTable>,
        probe: Rc<dyn Probe>,
        sleeper: Rc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Checker {
            manager,
            processes,
            probe,
            sleeper,
            policy,
        }
    }

    ///
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// A just started unit may not have spawned its process yet.
    pub fn process_running(&self, name: &str) -> Result<bool> {
        retry(self.sleeper.as_ref(), &self.policy, || {
            is_process_running(self.processes.as_ref(), name)
        })
    }

    /// one state query, no retry
    pub fn state(&self, unit: &str) -> Result<UnitActiveState> {
        self.manager.active_state(unit)
    }

    ///
    pub fn service_active(&self, unit: &str) -> Result<bool> {
        retry(self.sleeper.as_ref(), &self.policy, || {
            Ok(self.manager.active_state(unit)? == UnitActiveState::Active)
        })
    }

    ///
    pub fn endpoint_reachable(&self, url: &str) -> Result<bool> {
        retry(self.sleeper.as_ref(), &self.policy, || {
            Ok(self.probe.is_reachable(url))
        })
    }

    ///
    pub fn assert_process_running(&self, name: &str) -> Result<()> {
        ensure(
            self.sleeper.as_ref(),
            &self.policy,
            &format!("process {} running", name),
            || is_process_running(self.processes.as_ref(), name),
        )
    }

    ///
    pub fn assert_service_active(&self, unit: &str) -> Result<()> {
        ensure(
            self.sleeper.as_ref(),
            &self.policy,
            &format!("{} active", unit),
            || Ok(self.manager.active_state(unit)? == UnitActiveState::Active),
        )
    }

    ///
    pub fn assert_endpoint_reachable(&self, url: &str) -> Result<()> {
        ensure(
            self.sleeper.as_ref(),
            &self.policy,
            &format!("{} reachable", url),
            || Ok(self.probe.is_reachable(url)),
        )
    }
}
