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

//! Common used constants by unitprobe and its helper crates.

/// Default configuration file of the unitprobe harness
pub const CONFIG_FILE_PATH: &str = "/etc/unitprobe/unitprobe.toml";

/// Environment variable overriding the configuration file path
pub const CONFIG_FILE_ENV: &str = "UNITPROBE_CONFIG";

/// Default log file path when the log target is configured to "file"
pub const LOG_FILE_PATH: &str = "/var/log/unitprobe/unitprobe.log";

/// Suffix appended to unit names given without a type
pub const SERVICE_SUFFIX: &str = ".service";

/// RPC address of a locally running tezos node
pub const NODE_RPC_URL: &str = "http://localhost:8732";

/// User owning the tezos data directories
pub const TEZOS_USER: &str = "tezos";

/// Data directory of the packaged tezos signer
pub const SIGNER_DATA_DIR: &str = "/var/lib/tezos/signer";
