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

//! Scoped acquisition of a running unit.
//!
//! [`ServiceLifecycle::with_service`] starts a unit, waits for it to leave
//! `activating`, runs the body only if the unit became `active`, and stops
//! the unit again on every exit path: body success, body error, body panic
//! and failed start. Both waits are bounded.
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use crate::error::*;
use crate::manager::{JobMode, UnitManager};
use crate::retry::Sleeper;
use crate::state::UnitActiveState;

/// Polling and settle parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleOptions {
    /// delay between two state queries
    pub poll_interval: Duration,
    /// pause after a state change, readiness lags behind the reported state
    pub settle: Duration,
    /// longest time a unit may stay activating
    pub start_timeout: Duration,
    /// longest time a unit may take to become inactive or failed
    pub stop_timeout: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        LifecycleOptions {
            poll_interval: Duration::from_secs(1),
            settle: Duration::from_secs(5),
            start_timeout: Duration::from_secs(300),
            stop_timeout: Duration::from_secs(120),
        }
    }
}

/// The unit acquired by a scope, lent to its body.
pub struct ServiceHandle<'a> {
    unit: &'a str,
    manager: &'a dyn UnitManager,
}

impl<'a> ServiceHandle<'a> {
    ///
    pub fn name(&self) -> &str {
        self.unit
    }

    /// fresh state query
    pub fn state(&self) -> Result<UnitActiveState> {
        self.manager.active_state(self.unit)
    }
}

/// Outcome of a scope, keeping the teardown result apart from the body's.
#[derive(Debug)]
pub struct ScopeReport<T> {
    /// start failure or the body's own result
    pub outcome: Result<T>,
    /// result of stopping the unit
    pub teardown: Result<()>,
}

impl<T> ScopeReport<T> {
    /// The body or start error wins over a teardown error.
    pub fn into_result(self) -> Result<T> {
        match (self.outcome, self.teardown) {
            (Ok(v), Ok(())) => Ok(v),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(t)) => {
                log::error!("teardown failed as well: {}", t);
                Err(e)
            }
        }
    }
}

enum Convergence {
    Reached(UnitActiveState),
    TimedOut(UnitActiveState),
}

/// Starts and stops units in scopes.
pub struct ServiceLifecycle {
    manager: Rc<dyn UnitManager>,
    sleeper: Rc<dyn Sleeper>,
    options: LifecycleOptions,
}

impl ServiceLifecycle {
    ///
    pub fn new(
        manager: Rc<dyn UnitManager>,
        sleeper: Rc<dyn Sleeper>,
        options: LifecycleOptions,
    ) -> Self {
        ServiceLifecycle {
            manager,
            sleeper,
            options,
        }
    }

    ///
    pub fn options(&self) -> &LifecycleOptions {
        &self.options
    }

    /// Run `body` while `unit` is active, see [`ServiceLifecycle::scope`].
    pub fn with_service<T, F>(&self, unit: &str, body: F) -> Result<T>
    where
        F: FnOnce(&ServiceHandle) -> Result<T>,
    {
        self.scope(unit, body).into_result()
    }

    /// Start `unit`, run `body`, stop `unit`, and report both outcomes.
    ///
    /// A panic in `body` is resumed after the unit has been stopped.
    pub fn scope<T, F>(&self, unit: &str, body: F) -> ScopeReport<T>
    where
        F: FnOnce(&ServiceHandle) -> Result<T>,
    {
        let outcome = match self.start(unit) {
            Ok(()) => {
                let handle = ServiceHandle {
                    unit,
                    manager: self.manager.as_ref(),
                };
                panic::catch_unwind(AssertUnwindSafe(|| body(&handle)))
            }
            Err(e) => Ok(Err(e)),
        };

        let teardown = self.stop(unit);
        if let Err(e) = &teardown {
            log::error!("failed to tear down {}: {}", unit, e);
        }

        let outcome = match outcome {
            Ok(ret) => ret,
            Err(payload) => panic::resume_unwind(payload),
        };

        ScopeReport { outcome, teardown }
    }

    fn start(&self, unit: &str) -> Result<()> {
        log::info!("starting {}", unit);
        self.manager.start_unit(unit, JobMode::Replace)?;

        match self.converge(unit, self.options.start_timeout, |s| !s.is_activating())? {
            Convergence::Reached(UnitActiveState::Active) => {}
            Convergence::Reached(state) => {
                log::error!("{} failed to start: {}", unit, state);
                return Err(Error::StartFailed {
                    unit: unit.to_string(),
                    state,
                });
            }
            Convergence::TimedOut(_) => {
                return Err(Error::StartTimeout {
                    unit: unit.to_string(),
                    waited: self.options.start_timeout,
                })
            }
        }

        log::info!("{} is active", unit);
        self.sleeper.sleep(self.options.settle);
        Ok(())
    }

    fn stop(&self, unit: &str) -> Result<()> {
        log::info!("stopping {}", unit);
        self.manager.stop_unit(unit, JobMode::Replace)?;

        let waited = self.options.stop_timeout;
        if let Convergence::TimedOut(state) =
            self.converge(unit, waited, |s| s.is_inactive_or_failed())?
        {
            return Err(Error::StopTimeout {
                unit: unit.to_string(),
                waited,
                state,
            });
        }

        log::info!("{} is stopped", unit);
        self.sleeper.sleep(self.options.settle);
        Ok(())
    }

    /// Poll `unit` every poll interval until `done` holds or `timeout` is spent.
    fn converge<F>(&self, unit: &str, timeout: Duration, done: F) -> Result<Convergence>
    where
        F: Fn(UnitActiveState) -> bool,
    {
        let max_polls = polls_within(timeout, self.options.poll_interval);
        let mut polls = 0;

        loop {
            let state = self.manager.active_state(unit)?;
            if done(state) {
                return Ok(Convergence::Reached(state));
            }
            if polls >= max_polls {
                log::warn!("{} still {} after {:?}", unit, state, timeout);
                return Ok(Convergence::TimedOut(state));
            }
            log::debug!("{} is {}, waiting", unit, state);
            polls += 1;
            self.sleeper.sleep(self.options.poll_interval);
        }
    }
}

/// number of sleeps of `interval` that fit into `timeout`
fn polls_within(timeout: Duration, interval: Duration) -> u128 {
    if interval.is_zero() {
        return timeout.as_millis().max(1);
    }
    timeout.as_nanos() / interval.as_nanos()
}
