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

//! Rewrite `Environment="KEY=VALUE"` assignments of installed unit files.
//!
//! The edit is a plain line substitution followed by a daemon reload. It is
//! not transactional: when the reload fails the file is already changed.
use basic::exec_util;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::*;
use crate::manager::UnitManager;
use crate::state::UnitFileState;

/// One applied substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigFileEdit {
    ///
    pub path: PathBuf,
    ///
    pub key: String,
    ///
    pub old_value: String,
    ///
    pub new_value: String,
}

/// The in-memory result of [`substitute_environment`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    /// the matched line, without its line terminator
    pub old_line: String,
    /// its replacement
    pub new_line: String,
    /// value previously assigned to the key
    pub old_value: String,
    /// full file content after the substitution
    pub content: String,
}

fn check_assignment(key: &str, value: &str) -> Result<()> {
    let bad_key = key.is_empty()
        || key
            .chars()
            .any(|c| c == '=' || c == '"' || c == '\\' || c.is_whitespace());
    let bad_value = value.chars().any(|c| c == '"' || c == '\n' || c == '\r');
    if bad_key || bad_value {
        return Err(Error::InvalidEnvironment {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn environment_regex(key: &str) -> Result<Regex> {
    let pattern = format!(
        r#"(?m)^([ \t]*)Environment="{}=([^"\n]*)"([ \t\r]*)$"#,
        regex::escape(key)
    );
    Regex::new(&pattern).context(RegexSnafu)
}

/// Value assigned to `key` by the first `Environment="KEY=..."` line.
pub fn lookup_environment(content: &str, key: &str) -> Result<Option<String>> {
    let re = environment_regex(key)?;
    Ok(re.captures(content).map(|caps| caps[2].to_string()))
}

/// Replace the first `Environment="KEY=..."` line of `content` by
/// `Environment="KEY=VALUE"`, keeping every other byte. `None` if the key
/// is not assigned.
pub fn substitute_environment(content: &str, key: &str, value: &str) -> Result<Option<Substitution>> {
    check_assignment(key, value)?;
    let re = environment_regex(key)?;

    let caps = match re.captures(content) {
        Some(c) => c,
        None => return Ok(None),
    };
    let whole = match caps.get(0) {
        Some(m) => m,
        None => return Ok(None),
    };

    let old_line = whole.as_str().trim_end_matches('\r').to_string();
    let new_line = format!("{}Environment=\"{}={}\"{}", &caps[1], key, value, &caps[3]);
    let mut new_content = String::with_capacity(content.len() + value.len());
    new_content.push_str(&content[..whole.start()]);
    new_content.push_str(&new_line);
    new_content.push_str(&content[whole.end()..]);

    Ok(Some(Substitution {
        new_line: new_line.trim_end_matches('\r').to_string(),
        old_line,
        old_value: caps[2].to_string(),
        content: new_content,
    }))
}

/// Applies one whole-line replacement to a file.
pub trait FileEditor {
    /// replace the first line equal to `old_line` by `new_line`
    fn replace_line(&self, path: &Path, old_line: &str, new_line: &str) -> Result<()>;
}

/// Rewrites the file in process. Needs write access to the unit file.
#[derive(Default, Clone, Copy, Debug)]
pub struct DirectEditor;

impl FileEditor for DirectEditor {
    fn replace_line(&self, path: &Path, old_line: &str, new_line: &str) -> Result<()> {
        let content = fs::read_to_string(path).context(IoSnafu)?;

        let mut replaced = false;
        let mut out = String::with_capacity(content.len() + new_line.len());
        for line in content.split_inclusive('\n') {
            let body = line.trim_end_matches('\n').trim_end_matches('\r');
            if !replaced && body == old_line {
                out.push_str(new_line);
                out.push_str(&line[body.len()..]);
                replaced = true;
            } else {
                out.push_str(line);
            }
        }

        if !replaced {
            return Err(basic::Error::NotExisted {
                what: format!("line '{}' in {}", old_line, path.display()),
            }
            .into());
        }
        fs::write(path, out).context(IoSnafu)
    }
}

/// Edits with `sed -i`, through sudo when the unit file belongs to root.
#[derive(Clone, Copy, Debug)]
pub struct SedEditor {
    sudo: bool,
}

impl SedEditor {
    ///
    pub fn new(sudo: bool) -> Self {
        SedEditor { sudo }
    }

    /// full command line replacing the first `old_line` of `path`
    pub fn argv(&self, path: &Path, old_line: &str, new_line: &str) -> Vec<String> {
        let mut argv = Vec::new();
        if self.sudo {
            argv.push("sudo".to_string());
        }
        argv.push("sed".to_string());
        argv.push("-i".to_string());
        argv.push("-e".to_string());
        argv.push(sed_script(old_line, new_line));
        argv.push(path.to_string_lossy().to_string());
        argv
    }
}

impl FileEditor for SedEditor {
    fn replace_line(&self, path: &Path, old_line: &str, new_line: &str) -> Result<()> {
        let argv = self.argv(path, old_line, new_line);
        exec_util::exec_output(&argv)?;
        Ok(())
    }
}

/// Escape `s` so that a basic regular expression matches it literally.
fn bre_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        if matches!(c, '\\' | '.' | '*' | '[' | ']' | '^' | '$' | '/') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape `s` for the replacement part of a sed `s` command.
fn replacement_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        if matches!(c, '\\' | '&' | '/') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// GNU sed script replacing only the first line equal to `old_line`. A
/// carriage return ending the line is kept.
pub fn sed_script(old_line: &str, new_line: &str) -> String {
    format!(
        "0,/^{}\\(\\r\\?\\)$/s//{}\\1/",
        bre_escape(old_line),
        replacement_escape(new_line)
    )
}

/// Locates unit files through the service manager and edits their environment.
pub struct UnitEnvEditor {
    manager: Rc<dyn UnitManager>,
    editor: Box<dyn FileEditor>,
}

impl UnitEnvEditor {
    ///
    pub fn new(manager: Rc<dyn UnitManager>, editor: Box<dyn FileEditor>) -> Self {
        UnitEnvEditor { manager, editor }
    }

    /// The single enabled or disabled unit file backing `service`.
    pub fn resolve_unit_file(&self, service: &str) -> Result<PathBuf> {
        let entries = self.manager.list_unit_files(
            &[UnitFileState::Enabled, UnitFileState::Disabled],
            &[service],
        )?;

        let mut paths: Vec<PathBuf> = entries.into_iter().map(|e| e.path).collect();
        paths.sort();
        paths.dedup();
        match paths.len() {
            0 => Err(Error::UnitFileNotFound {
                unit: service.to_string(),
            }),
            1 => Ok(paths.remove(0)),
            _ => Err(Error::AmbiguousUnitFile {
                unit: service.to_string(),
                paths,
            }),
        }
    }

    /// current value of `key` in the unit file of `service`
    pub fn get_environment_variable(&self, service: &str, key: &str) -> Result<Option<String>> {
        let path = self.resolve_unit_file(service)?;
        let content = fs::read_to_string(&path).context(IoSnafu)?;
        lookup_environment(&content, key)
    }

    /// Assign `value` to `key` in the unit file of `service` and reload the
    /// manager. `Ok(None)` when the file has no assignment for `key`; the
    /// file is then left untouched and no reload happens.
    pub fn set_environment_variable(
        &self,
        service: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<ConfigFileEdit>> {
        let path = self.resolve_unit_file(service)?;
        let content = fs::read_to_string(&path).context(IoSnafu)?;

        let sub = match substitute_environment(&content, key, value)? {
            Some(s) => s,
            None => {
                log::info!("{} has no {} assignment in {}", service, key, path.display());
                return Ok(None);
            }
        };

        log::info!(
            "{}: {}={} -> {}={} in {}",
            service,
            key,
            sub.old_value,
            key,
            value,
            path.display()
        );
        self.editor.replace_line(&path, &sub.old_line, &sub.new_line)?;
        let written = fs::read_to_string(&path).context(IoSnafu)?;
        if written != sub.content {
            return Err(Error::EditNotApplied {
                path,
                key: key.to_string(),
            });
        }
        self.manager.daemon_reload()?;

        Ok(Some(ConfigFileEdit {
            path,
            key: key.to_string(),
            old_value: sub.old_value,
            new_value: value.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeManager;
    use libtests::{UnitFixture, NODE_UNIT};

    const NODE: &str = "tezos-node-mainnet.service";

    fn editor(fixture: &UnitFixture) -> (Rc<FakeManager>, UnitEnvEditor) {
        let manager = Rc::new(FakeManager::default());
        manager.add_unit_file(NODE, fixture.path().to_path_buf(), UnitFileState::Disabled);
        let editor = UnitEnvEditor::new(manager.clone(), Box::new(DirectEditor));
        (manager, editor)
    }

    #[test]
    fn test_substitute_environment() {
        let sub = substitute_environment(NODE_UNIT, "NETWORK", "jakartanet")
            .unwrap()
            .unwrap();
        assert_eq!(sub.old_value, "mainnet");
        assert_eq!(sub.old_line, "Environment=\"NETWORK=mainnet\"");
        assert_eq!(sub.new_line, "Environment=\"NETWORK=jakartanet\"");
        assert_eq!(
            sub.content,
            NODE_UNIT.replace("NETWORK=mainnet", "NETWORK=jakartanet")
        );

        /* a key that is only a suffix of another key does not match */
        assert_eq!(substitute_environment(NODE_UNIT, "PATH", "x").unwrap(), None);
        assert!(substitute_environment(NODE_UNIT, "BAD KEY", "x").is_err());
        assert!(substitute_environment(NODE_UNIT, "NETWORK", "a\"b").is_err());
    }

    #[test]
    fn test_substitute_keeps_indent_and_crlf() {
        let content = "[Service]\r\n  Environment=\"A=1\"\r\nExecStart=/bin/true\r\n";
        let sub = substitute_environment(content, "A", "2").unwrap().unwrap();
        assert_eq!(
            sub.content,
            "[Service]\r\n  Environment=\"A=2\"\r\nExecStart=/bin/true\r\n"
        );
        assert_eq!(sub.old_line, "  Environment=\"A=1\"");
    }

    #[test]
    fn test_set_round_trip() {
        let fixture = UnitFixture::node_unit().unwrap();
        let (manager, editor) = editor(&fixture);
        let before = fixture.environment_lines().unwrap();

        let edit = editor
            .set_environment_variable(NODE, "NODE_RPC_ADDR", "0.0.0.0:8732")
            .unwrap()
            .unwrap();
        assert_eq!(edit.old_value, "127.0.0.1:8732");
        assert_eq!(edit.path, fixture.path());

        let after = fixture.environment_lines().unwrap();
        assert_eq!(after.len(), before.len());
        for (b, a) in before.iter().zip(after.iter()) {
            if b.contains("NODE_RPC_ADDR=") {
                assert_eq!(a, "Environment=\"NODE_RPC_ADDR=0.0.0.0:8732\"");
            } else {
                assert_eq!(a, b);
            }
        }

        editor
            .set_environment_variable(NODE, "NODE_RPC_ADDR", "127.0.0.1:18732")
            .unwrap()
            .unwrap();
        let content = fixture.read().unwrap();
        assert_eq!(content.matches("NODE_RPC_ADDR=").count(), 1);
        assert!(content.contains("Environment=\"NODE_RPC_ADDR=127.0.0.1:18732\""));
        assert_eq!(
            editor.get_environment_variable(NODE, "NODE_RPC_ADDR").unwrap(),
            Some("127.0.0.1:18732".to_string())
        );

        let reloads = manager
            .calls()
            .iter()
            .filter(|c| c.as_str() == "daemon-reload")
            .count();
        assert_eq!(reloads, 2);
    }

    #[test]
    fn test_set_missing_key() {
        let fixture = UnitFixture::node_unit().unwrap();
        let (manager, editor) = editor(&fixture);

        let ret = editor
            .set_environment_variable(NODE, "NO_SUCH_KEY", "1")
            .unwrap();
        assert_eq!(ret, None);
        assert_eq!(fixture.read().unwrap(), NODE_UNIT);
        assert!(!manager.calls().contains(&"daemon-reload".to_string()));
    }

    #[test]
    fn test_resolve_unit_file() {
        let fixture = UnitFixture::node_unit().unwrap();
        let (manager, editor) = editor(&fixture);

        assert_eq!(editor.resolve_unit_file(NODE).unwrap(), fixture.path());
        assert!(matches!(
            editor.resolve_unit_file("tezos-signer-http.service"),
            Err(Error::UnitFileNotFound { .. })
        ));

        manager.add_unit_file(
            "tezos-node-jakartanet.service",
            fixture.dir().join("tezos-node-jakartanet.service"),
            UnitFileState::Enabled,
        );
        match editor.resolve_unit_file("tezos-node-*.service") {
            Err(Error::AmbiguousUnitFile { paths, .. }) => assert_eq!(paths.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }

        /* masked and static files are not candidates */
        manager.add_unit_file(
            "tezos-accuser-013-ptjakart.service",
            fixture.dir().join("tezos-accuser-013-ptjakart.service"),
            UnitFileState::Masked,
        );
        assert!(editor
            .resolve_unit_file("tezos-accuser-013-ptjakart.service")
            .is_err());
    }

    #[test]
    fn test_reload_failure_leaves_file_changed() {
        let fixture = UnitFixture::node_unit().unwrap();
        let (manager, editor) = editor(&fixture);
        manager.fail_reload();

        let ret = editor.set_environment_variable(NODE, "NETWORK", "jakartanet");
        assert!(matches!(ret, Err(Error::Manager { .. })));
        assert!(fixture
            .read()
            .unwrap()
            .contains("Environment=\"NETWORK=jakartanet\""));
    }

    #[test]
    fn test_sed_script() {
        assert_eq!(
            sed_script(
                "Environment=\"NODE_DATA_DIR=/var/lib/tezos/node-mainnet\"",
                "Environment=\"NODE_DATA_DIR=/srv/a&b\""
            ),
            "0,/^Environment=\"NODE_DATA_DIR=\\/var\\/lib\\/tezos\\/node-mainnet\"\\(\\r\\?\\)$/s//Environment=\"NODE_DATA_DIR=\\/srv\\/a\\&b\"\\1/"
        );
        assert_eq!(bre_escape("a.b*[c]^$\\"), "a\\.b\\*\\[c\\]\\^\\$\\\\");

        let argv = SedEditor::new(true).argv(Path::new("/etc/systemd/system/x.service"), "a", "b");
        assert_eq!(argv[0], "sudo");
        assert_eq!(argv[1], "sed");
        assert_eq!(argv.last().unwrap(), "/etc/systemd/system/x.service");
    }

    #[test]
    fn test_sed_editor_on_file() {
        let fixture = UnitFixture::node_unit().unwrap();
        let editor = SedEditor::new(false);
        if editor
            .replace_line(
                fixture.path(),
                "Environment=\"NODE_DATA_DIR=/var/lib/tezos/node-mainnet\"",
                "Environment=\"NODE_DATA_DIR=/srv/tezos & co\"",
            )
            .is_err()
        {
            /* no GNU sed on this host */
            return;
        }
        assert_eq!(
            fixture.read().unwrap(),
            NODE_UNIT.replace("/var/lib/tezos/node-mainnet", "/srv/tezos & co")
        );
    }

    #[test]
    fn test_sed_editor_crlf_file() {
        let fixture =
            UnitFixture::new(NODE, "[Service]\r\nEnvironment=\"A=1\"\r\nExecStart=/bin/true\r\n").unwrap();
        let manager = Rc::new(FakeManager::default());
        manager.add_unit_file(NODE, fixture.path().to_path_buf(), UnitFileState::Enabled);
        let editor = UnitEnvEditor::new(manager.clone(), Box::new(SedEditor::new(false)));

        match editor.set_environment_variable(NODE, "A", "2") {
            Ok(edit) => assert_eq!(edit.unwrap().old_value, "1"),
            /* no GNU sed on this host */
            Err(Error::Util { .. }) => return,
            Err(e) => panic!("unexpected error: {}", e),
        }
        assert_eq!(
            fixture.read().unwrap(),
            "[Service]\r\nEnvironment=\"A=2\"\r\nExecStart=/bin/true\r\n"
        );
        assert_eq!(manager.calls().last().unwrap(), "daemon-reload");
    }

    struct Untouched;

    impl FileEditor for Untouched {
        fn replace_line(&self, _path: &Path, _old_line: &str, _new_line: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_edit_not_applied() {
        let fixture = UnitFixture::node_unit().unwrap();
        let manager = Rc::new(FakeManager::default());
        manager.add_unit_file(NODE, fixture.path().to_path_buf(), UnitFileState::Disabled);
        let editor = UnitEnvEditor::new(manager.clone(), Box::new(Untouched));

        let ret = editor.set_environment_variable(NODE, "NETWORK", "jakartanet");
        match ret {
            Err(Error::EditNotApplied { path, key }) => {
                assert_eq!(path, fixture.path());
                assert_eq!(key, "NETWORK");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(fixture.read().unwrap(), NODE_UNIT);
        assert!(!manager.calls().contains(&"daemon-reload".to_string()));
    }

    #[test]
    fn test_resolve_same_path_listed_twice() {
        let fixture = UnitFixture::node_unit().unwrap();
        let (manager, editor) = editor(&fixture);
        manager.add_unit_file(
            "tezos-node-jakartanet.service",
            fixture.dir().join("tezos-node-jakartanet.service"),
            UnitFileState::Enabled,
        );
        manager.add_unit_file(NODE, fixture.path().to_path_buf(), UnitFileState::Enabled);

        /* node, jakartanet, node again: one distinct path per unit */
        assert_eq!(
            editor.resolve_unit_file("tezos-node-m*.service").unwrap(),
            fixture.path()
        );
        match editor.resolve_unit_file("tezos-node-*.service") {
            Err(Error::AmbiguousUnitFile { paths, .. }) => assert_eq!(paths.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
