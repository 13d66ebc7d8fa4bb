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

//! Test doubles for the collaborator traits.
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

use crate::endpoint::Probe;
use crate::error::*;
use crate::manager::{unit_pattern_matches, JobMode, UnitFileEntry, UnitManager};
use crate::process::ProcessTable;
use crate::retry::Sleeper;
use crate::state::{UnitActiveState, UnitFileState};
use crate::tools::ToolRunner;

/// Records every sleep instead of sleeping.
#[derive(Default)]
pub struct FakeSleeper {
    slept: RefCell<Vec<Duration>>,
}

impl FakeSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.slept.borrow().len()
    }

    pub fn total(&self) -> Duration {
        self.slept.borrow().iter().sum()
    }
}

impl Sleeper for FakeSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

/// A scripted service manager.
///
/// Each unit has a queue of states. A state query pops the queue until one
/// state is left, which is then repeated. Starting a unit loads its start
/// script (default: active), stopping loads its stop script (default:
/// inactive). Unknown units are inactive.
#[derive(Default)]
pub struct FakeManager {
    calls: RefCell<Vec<String>>,
    states: RefCell<HashMap<String, VecDeque<UnitActiveState>>>,
    start_scripts: RefCell<HashMap<String, Vec<UnitActiveState>>>,
    stop_scripts: RefCell<HashMap<String, Vec<UnitActiveState>>>,
    unit_files: RefCell<Vec<(String, UnitFileEntry)>>,
    fail_reload: Cell<bool>,
}

impl FakeManager {
    pub fn script_start(&self, unit: &str, states: &[UnitActiveState]) {
        self.start_scripts
            .borrow_mut()
            .insert(unit.to_string(), states.to_vec());
    }

    pub fn script_stop(&self, unit: &str, states: &[UnitActiveState]) {
        self.stop_scripts
            .borrow_mut()
            .insert(unit.to_string(), states.to_vec());
    }

    pub fn set_state(&self, unit: &str, state: UnitActiveState) {
        self.states
            .borrow_mut()
            .insert(unit.to_string(), VecDeque::from(vec![state]));
    }

    pub fn add_unit_file(&self, name: &str, path: PathBuf, state: UnitFileState) {
        self.unit_files
            .borrow_mut()
            .push((name.to_string(), UnitFileEntry { path, state }));
    }

    pub fn fail_reload(&self) {
        self.fail_reload.set(true);
    }

    /// "start <unit> <mode>", "stop <unit> <mode>", "daemon-reload", ...
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn load(&self, unit: &str, script: Option<Vec<UnitActiveState>>, default: UnitActiveState) {
        let script = script.unwrap_or_else(|| vec![default]);
        self.states
            .borrow_mut()
            .insert(unit.to_string(), VecDeque::from(script));
    }
}

impl UnitManager for FakeManager {
    fn start_unit(&self, unit: &str, mode: JobMode) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("start {} {}", unit, mode));
        let script = self.start_scripts.borrow().get(unit).cloned();
        self.load(unit, script, UnitActiveState::Active);
        Ok(())
    }

    fn stop_unit(&self, unit: &str, mode: JobMode) -> Result<()> {
        self.calls.borrow_mut().push(format!("stop {} {}", unit, mode));
        let script = self.stop_scripts.borrow().get(unit).cloned();
        self.load(unit, script, UnitActiveState::InActive);
        Ok(())
    }

    fn active_state(&self, unit: &str) -> Result<UnitActiveState> {
        let mut states = self.states.borrow_mut();
        let queue = match states.get_mut(unit) {
            Some(q) => q,
            None => return Ok(UnitActiveState::InActive),
        };
        if queue.len() > 1 {
            return Ok(queue.pop_front().unwrap_or(UnitActiveState::Unknown));
        }
        Ok(queue.front().copied().unwrap_or(UnitActiveState::Unknown))
    }

    fn list_unit_files(
        &self,
        states: &[UnitFileState],
        patterns: &[&str],
    ) -> Result<Vec<UnitFileEntry>> {
        self.calls
            .borrow_mut()
            .push(format!("list-unit-files {}", patterns.join(" ")));
        Ok(self
            .unit_files
            .borrow()
            .iter()
            .filter(|(name, entry)| {
                states.contains(&entry.state)
                    && patterns.iter().any(|p| unit_pattern_matches(p, name))
            })
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    fn daemon_reload(&self) -> Result<()> {
        self.calls.borrow_mut().push("daemon-reload".to_string());
        if self.fail_reload.get() {
            return Err(Error::Manager {
                cmd: "systemctl daemon-reload".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Access denied".to_string(),
            });
        }
        Ok(())
    }
}

/// A fixed process table, optionally empty for the first reads.
pub struct FakeProcessTable {
    names: Vec<String>,
    hidden_for: u32,
    reads: Cell<u32>,
}

impl FakeProcessTable {
    pub fn new(names: &[&str]) -> Self {
        FakeProcessTable {
            names: names.iter().map(|s| s.to_string()).collect(),
            hidden_for: 0,
            reads: Cell::new(0),
        }
    }

    /// the first `reads` reads see an empty table
    pub fn hidden_for(mut self, reads: u32) -> Self {
        self.hidden_for = reads;
        self
    }

    pub fn reads(&self) -> u32 {
        self.reads.get()
    }
}

impl ProcessTable for FakeProcessTable {
    fn process_names(&self) -> Result<Vec<String>> {
        let n = self.reads.get();
        self.reads.set(n + 1);
        if n < self.hidden_for {
            return Ok(Vec::new());
        }
        Ok(self.names.clone())
    }
}

/// Reachable iff the URL is in the configured set.
#[derive(Default)]
pub struct FakeProbe {
    urls: Vec<String>,
    calls: Cell<u32>,
}

impl FakeProbe {
    pub fn reachable(urls: &[&str]) -> Self {
        FakeProbe {
            urls: urls.iter().map(|s| s.to_string()).collect(),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl Probe for FakeProbe {
    fn is_reachable(&self, url: &str) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.urls.iter().any(|u| u == url)
    }
}

/// Records command lines and answers with canned output.
///
/// Output is chosen by the longest registered prefix of the joined command
/// line. A command line starting with a failing prefix returns a tool error.
#[derive(Default)]
pub struct FakeTools {
    calls: RefCell<Vec<String>>,
    outputs: Vec<(String, String)>,
    failing: Vec<String>,
}

impl FakeTools {
    pub fn output(mut self, prefix: &str, out: &str) -> Self {
        self.outputs.push((prefix.to_string(), out.to_string()));
        self
    }

    pub fn failing(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ToolRunner for FakeTools {
    fn run(&self, argv: &[String]) -> Result<String> {
        let cmd = argv.join(" ");
        self.calls.borrow_mut().push(cmd.clone());

        if self.failing.iter().any(|p| cmd.starts_with(p.as_str())) {
            return Err(Error::Tool {
                cmd,
                status: "exit status: 1".to_string(),
                stderr: "failed".to_string(),
            });
        }

        Ok(self
            .outputs
            .iter()
            .filter(|(p, _)| cmd.starts_with(p.as_str()))
            .max_by_key(|(p, _)| p.len())
            .map(|(_, out)| out.clone())
            .unwrap_or_default())
    }
}
