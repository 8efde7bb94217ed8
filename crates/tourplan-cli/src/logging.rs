use std::io::Write;

use anyhow::{Result, anyhow};
use clap::ValueEnum;
use env_logger::{Builder, Target, WriteStyle, fmt::Formatter};
use log::{Level, LevelFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

/// Install a stderr logger so stdout stays clean for JSON and DOT output.
pub fn init(level: LogLevel) -> Result<()> {
    Builder::new()
        .filter_level(level.to_filter())
        .write_style(WriteStyle::Never)
        .target(Target::Stderr)
        .format(|buf: &mut Formatter, record| {
            writeln!(buf, "{} {}", level_tag(record.level()), record.args())
        })
        .try_init()
        .map_err(|e| anyhow!("logger init failed: {e}"))
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_is_warn() {
        assert_eq!(LogLevel::default().to_filter(), LevelFilter::Warn);
    }

    #[test]
    fn test_off_disables_logging() {
        assert_eq!(LogLevel::Off.to_filter(), LevelFilter::Off);
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(Level::Debug), "DEBUG");
        assert_eq!(level_tag(Level::Error), "ERROR");
    }
}
