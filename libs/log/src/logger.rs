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

//!
use log::{Level, LevelFilter, Log};
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    os::unix::{net::UnixDatagram, prelude::OpenOptionsExt},
    path::{Path, PathBuf},
    sync::Mutex,
};

const SYSLOG_SOCKET: &str = "/dev/log";

fn now_str() -> String {
    let time: libc::time_t = unsafe { libc::time(std::ptr::null_mut()) };
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    if unsafe { libc::localtime_r(&time, &mut tm) }.is_null() {
        return String::from("0000-00-00 00:00:00 ");
    }
    format!(
        "{:0>4}-{:0>2}-{:0>2} {:0>2}:{:0>2}:{:0>2} ",
        tm.tm_year + 1900, /* tm_year is years since 1900 */
        tm.tm_mon + 1,     /* tm_mon is months since Jan: [0, 11] */
        tm.tm_mday,
        tm.tm_hour,
        tm.tm_min,
        tm.tm_sec
    )
}

fn format_msg(record: &log::Record) -> String {
    let module = record.module_path().unwrap_or("unknown");
    format!("{} {} {}\n", now_str(), module, record.args())
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let msg = format_msg(record);
        /* warnings and errors go to stderr so they survive stdout capture */
        let ret = if record.level() <= Level::Warn {
            std::io::stderr().write_all(msg.as_bytes())
        } else {
            std::io::stdout().write_all(msg.as_bytes())
        };
        if let Err(e) = ret {
            eprintln!("Failed to log message: {}", e);
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

struct SysLogger {
    dgram: UnixDatagram,
}

impl SysLogger {
    fn new() -> std::io::Result<Self> {
        let dgram = UnixDatagram::unbound()?;
        dgram.connect(SYSLOG_SOCKET)?;
        Ok(Self { dgram })
    }
}

impl Log for SysLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let msg = format!(
            "{} {}",
            record.module_path().unwrap_or("unknown"),
            record.args()
        );
        if let Err(e) = self.dgram.send(msg.as_bytes()) {
            eprintln!("Failed to send message to syslogger: {}", e);
        }
    }

    fn flush(&self) {}
}

struct FileLogger {
    file_path: PathBuf,
    file: Mutex<File>,
}

impl FileLogger {
    fn new(file_path: &Path) -> std::io::Result<Self> {
        if let Some(dir) = file_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o600)
            .open(file_path)?;

        Ok(Self {
            file_path: file_path.to_path_buf(),
            file: Mutex::new(file),
        })
    }
}

impl Log for FileLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let mut file = match self.file.lock() {
            Err(_) => return,
            Ok(v) => v,
        };
        if let Err(e) = file.write_all(format_msg(record).as_bytes()) {
            eprintln!(
                "Failed to write log file '{}': {}",
                self.file_path.display(),
                e
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Collect different kinds of loggers together.
///
/// Include: SysLogger, ConsoleLogger, FileLogger
struct CombinedLogger {
    loggers: Vec<Box<dyn Log>>,
}

impl Log for CombinedLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        for logger in &self.loggers {
            logger.log(record);
        }
    }

    fn flush(&self) {
        for logger in &self.loggers {
            logger.flush();
        }
    }
}

/// Parse a level name such as "info" or "DEBUG".
pub fn parse_level(s: &str) -> Option<Level> {
    s.trim().parse::<Level>().ok()
}

/// Initialize the global logger instance.
/// Available log `targets` include `file`, `syslog`, `console`.
/// `file_path` only takes effect on the `file` target.
///
/// The global logger can be installed once per process. Later calls only
/// change the maximum level.
///
/// # Arguments
///
/// * `name` - The application name that initializes the logger. Just used for debugging.
/// * `level` - Log message level.
/// * `targets` - A set of log targets.
/// * `file_path` - The log file path.
pub fn init_log(name: &str, level: Level, targets: Vec<&str>, file_path: &str) {
    let mut loggers: Vec<Box<dyn Log>> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for target in targets {
        if seen.contains(&target) {
            continue;
        }
        seen.push(target);

        let logger = match target {
            "console" => Box::new(ConsoleLogger) as Box<dyn Log>,
            "syslog" => match SysLogger::new() {
                Ok(logger) => Box::new(logger) as Box<dyn Log>,
                Err(e) => {
                    eprintln!("{} failed to create syslogger: {:?}", name, e);
                    continue;
                }
            },
            "file" => match FileLogger::new(Path::new(file_path)) {
                Ok(logger) => Box::new(logger) as Box<dyn Log>,
                Err(e) => {
                    eprintln!(
                        "{} failed to create '{}' file logger: {:?}",
                        name, file_path, e
                    );
                    continue;
                }
            },
            _ => {
                eprintln!("{}: log target '{}' is strange, ignoring.", name, target);
                continue;
            }
        };
        loggers.push(logger);
    }

    if loggers.is_empty() {
        eprintln!("{}: no available log targets.", name);
    }

    log::set_max_level(level.to_level_filter());
    if log::set_boxed_logger(Box::new(CombinedLogger { loggers })).is_err() {
        log::debug!("{}: global logger already set, only the level is updated", name);
    }
}

/// Current maximum level as a filter, mainly for tests.
pub fn current_level() -> LevelFilter {
    log::max_level()
}
