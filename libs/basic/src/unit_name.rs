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

//! Interfaces related to the unit name.
//!
use crate::error::*;
use constants::SERVICE_SUFFIX;

const UNIT_NAME_MAX: usize = 256;

/// Check that a unit name can be passed to the service manager as is.
pub fn unit_name_is_valid(name: &str) -> bool {
    if name.is_empty() || name.len() >= UNIT_NAME_MAX {
        return false;
    }

    if name.starts_with('.') || name.starts_with('@') {
        return false;
    }

    !name.chars().any(|c| c == '/' || c.is_whitespace())
}

/// Append the ".service" suffix if the name carries no unit type suffix.
pub fn unit_name_mangle(name: &str) -> Result<String> {
    if !unit_name_is_valid(name) {
        return Err(Error::Invalid {
            what: format!("unit name {}", name),
        });
    }

    let has_suffix = name
        .rfind('.')
        .map(|pos| pos > 0 && !name[pos + 1..].is_empty() && !name[pos + 1..].contains('@'))
        .unwrap_or(false);
    if has_suffix {
        return Ok(name.to_string());
    }

    Ok(format!("{}{}", name, SERVICE_SUFFIX))
}

/// Build "prefix@instance.service" from a template prefix and an instance.
pub fn unit_name_build_instance(prefix: &str, instance: &str) -> Result<String> {
    if instance.is_empty() {
        return Err(Error::Invalid {
            what: format!("empty instance for template {}", prefix),
        });
    }
    unit_name_mangle(&format!("{}@{}", prefix, instance))
}
