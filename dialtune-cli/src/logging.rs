//! Console logger for the `log` facade.

use anyhow::{Result, anyhow};
use colored::{Color, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record};

pub struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            fn colored_level(level: Level) -> Color {
                match level {
                    Level::Error => Color::Red,
                    Level::Warn => Color::Yellow,
                    Level::Info => Color::Green,
                    Level::Debug => Color::Blue,
                    Level::Trace => Color::Cyan,
                }
            }

            eprintln!(
                "[{:>5}][{}] {}",
                record.level().as_str().color(colored_level(record.level())),
                std::thread::current().name().unwrap_or("main").yellow(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Maps `-v` occurrences to a level filter. Warnings are always shown.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the console logger.
pub fn init(verbosity: u8) -> Result<()> {
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(level_for(verbosity)))
        .map_err(|e| anyhow!("failed to install logger: {e}"))
}
