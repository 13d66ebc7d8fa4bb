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

use unitprobe::{ProbeConfig, Scenario, ScenarioRunner};

pub fn config() -> ProbeConfig {
    let config = ProbeConfig::new(None).expect("failed to load configuration");
    log::init_log_to_console("services_test", log::Level::Debug);
    config
}

pub fn run_scenario(name: &str) {
    let config = config();
    let runner = ScenarioRunner::from_config(&config).expect("failed to build runner");
    let scenario = Scenario::by_name(name).expect("unknown scenario");

    println!("[{}]: running", name);
    if let Err(e) = runner.run(&scenario) {
        panic!("[{}]: {}", name, e);
    }
    println!("[{}]: ok", name);
}
