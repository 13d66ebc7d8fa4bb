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

//! Bounded retry with a fixed delay between attempts.
use std::time::Duration;

use crate::error::*;

const DEFAULT_ATTEMPTS: u32 = 10;
const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// How often and how patiently a check is repeated.
///
/// `max_attempts` counts the retries after the first evaluation, so a policy
/// with zero attempts evaluates its predicate exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    ///
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            delay,
        }
    }

    /// single evaluation, no sleeping
    pub fn once() -> Self {
        RetryPolicy::new(0, Duration::ZERO)
    }

    ///
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    ///
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(DEFAULT_ATTEMPTS, DEFAULT_DELAY)
    }
}

/// Blocking sleep, replaced by a recording fake in tests.
pub trait Sleeper {
    ///
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Evaluate `predicate` until it holds or the policy is exhausted.
///
/// Returns `Ok(false)` after `max_attempts + 1` false evaluations and
/// `max_attempts` sleeps. An error from the predicate is returned at once.
pub fn retry<F>(sleeper: &dyn Sleeper, policy: &RetryPolicy, mut predicate: F) -> Result<bool>
where
    F: FnMut() -> Result<bool>,
{
    let mut remaining = policy.max_attempts;
    loop {
        if predicate()? {
            return Ok(true);
        }
        if remaining == 0 {
            return Ok(false);
        }
        remaining -= 1;
        sleeper.sleep(policy.delay);
    }
}

/// Like [`retry`], but an exhausted policy is an [`Error::PredicateTimeout`].
pub fn ensure<F>(sleeper: &dyn Sleeper, policy: &RetryPolicy, what: &str, predicate: F) -> Result<()>
where
    F: FnMut() -> Result<bool>,
{
    if retry(sleeper, policy, predicate)? {
        return Ok(());
    }

    log::warn!(
        "'{}' still false after {} attempts",
        what,
        policy.max_attempts + 1
    );
    Err(Error::PredicateTimeout {
        what: what.to_string(),
        attempts: policy.max_attempts + 1,
    })
}
