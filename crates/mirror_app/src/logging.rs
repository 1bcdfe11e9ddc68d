//! Logger setup for the mirror daemon.
//!
//! Terminal output always; `NOTION_MIRROR_LOG_FILE` adds a file log.
//! `NOTION_MIRROR_LOG` picks the level (`error` .. `trace`, default `info`).

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const LEVEL_ENV_VAR: &str = "NOTION_MIRROR_LOG";
pub const FILE_ENV_VAR: &str = "NOTION_MIRROR_LOG_FILE";

/// Destination for log output.
pub enum LogDestination {
    Terminal,
    /// Terminal plus the given file, truncated at startup.
    Both(PathBuf),
}

impl LogDestination {
    pub fn from_env() -> Self {
        match std::env::var_os(FILE_ENV_VAR) {
            Some(path) if !path.is_empty() => LogDestination::Both(PathBuf::from(path)),
            _ => LogDestination::Terminal,
        }
    }
}

pub fn initialize(destination: LogDestination) {
    let level = parse_level(std::env::var(LEVEL_ENV_VAR).ok().as_deref());
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let LogDestination::Both(path) = destination {
        if let Some(file_logger) = create_file_logger(&path, level, config) {
            loggers.push(file_logger);
        }
    }

    let _ = CombinedLogger::init(loggers);
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
