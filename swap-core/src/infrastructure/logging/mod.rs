//! Logging infrastructure using `log` + `log4rs`.
//!
//! `tracing` events emitted by the crates are forwarded through its `log` feature.

mod consts;

pub use consts::*;

use crate::foundation::SwapError;
use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            policy::compound::{roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy},
            RollingFileAppender,
        },
    },
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::io::IsTerminal;
use std::path::Path;

const CONSOLE_APPENDER: &str = "stderr";
const LOG_FILE_APPENDER: &str = "log_file";
const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

/// Parsed form of a filter expression such as `"info,swap_core=debug,root=warn"`.
///
/// A bare level sets the level of our own crates (INFO when absent). `root=<level>` opts every
/// third party crate in; `<module>=<level>` opts one module in or overrides one of ours.
#[derive(Debug, PartialEq, Eq)]
pub struct LogFilters {
    pub app: LevelFilter,
    pub root: LevelFilter,
    pub modules: Vec<(String, LevelFilter)>,
}

impl LogFilters {
    /// Unparseable parts are skipped.
    pub fn parse(filters: &str) -> Self {
        let mut app = None;
        let mut root = None;
        let mut modules = Vec::new();
        for part in filters.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            match part.split_once('=') {
                None => {
                    if app.is_none() {
                        app = part.parse().ok();
                    }
                }
                Some((module, level)) => {
                    let (module, level) = (module.trim(), level.trim());
                    let Ok(level) = level.parse::<LevelFilter>() else {
                        continue;
                    };
                    match module {
                        "" => {}
                        "root" => root = root.or(Some(level)),
                        _ => modules.push((module.to_string(), level)),
                    }
                }
            }
        }
        Self { app: app.unwrap_or(LevelFilter::Info), root: root.unwrap_or(LevelFilter::Off), modules }
    }

    /// Our crates at `app`, minus those the expression names explicitly, then the named modules.
    fn loggers(&self) -> Vec<(String, LevelFilter)> {
        let mut loggers = WHITELISTED_CRATES
            .iter()
            .filter(|name| !self.modules.iter().any(|(module, _)| module == *name))
            .map(|name| (name.to_string(), self.app))
            .collect::<Vec<_>>();
        loggers.extend(self.modules.iter().cloned());
        loggers
    }
}

/// Installs the global logger: stderr always, plus `swap.log` and a warn-and-above `swap_err.log`
/// when `log_dir` is given. A second call keeps the first logger.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), SwapError> {
    let filters = LogFilters::parse(filters);

    let pattern = if std::io::stderr().is_terminal() { LOG_LINE_PATTERN_COLORED } else { LOG_LINE_PATTERN };
    let console = ConsoleAppender::builder().target(Target::Stderr).encoder(Box::new(PatternEncoder::new(pattern))).build();
    let mut builder = Config::builder().appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));
    let mut appenders = vec![CONSOLE_APPENDER.to_string()];

    if let Some(dir) = log_dir.map(str::trim).filter(|dir| !dir.is_empty()) {
        builder = builder.appender(Appender::builder().build(LOG_FILE_APPENDER, Box::new(rolling_file_appender(dir, LOG_FILE_NAME)?)));
        builder = builder.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Warn)))
                .build(ERR_LOG_FILE_APPENDER, Box::new(rolling_file_appender(dir, ERR_LOG_FILE_NAME)?)),
        );
        appenders.push(LOG_FILE_APPENDER.to_string());
        appenders.push(ERR_LOG_FILE_APPENDER.to_string());
    }

    for (module, level) in filters.loggers() {
        builder = builder.logger(Logger::builder().appenders(appenders.clone()).additive(false).build(module, level));
    }
    let config = builder
        .build(Root::builder().appenders(appenders).build(filters.root))
        .map_err(|err| SwapError::ConfigError(format!("invalid logger config: {err}")))?;
    let _ = log4rs::init_config(config);
    Ok(())
}

fn rolling_file_appender(dir: &str, file_name: &str) -> Result<RollingFileAppender, SwapError> {
    let dir = Path::new(dir);
    let archive_pattern = dir.join(format!("{file_name}.{{}}.gz")).to_string_lossy().to_string();
    let roller = FixedWindowRoller::builder()
        .base(1)
        .build(&archive_pattern, LOG_FILE_MAX_ROLLS)
        .map_err(|err| SwapError::ConfigError(format!("invalid log roller for {file_name}: {err}")))?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(LOG_FILE_MAX_SIZE)), Box::new(roller));

    RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
        .build(dir.join(file_name), Box::new(policy))
        .map_err(|err| SwapError::StorageError { operation: format!("open log file {file_name}"), details: err.to_string() })
}
