//! Routes records from the `log` facade through a [`Logger`].
//!
//! `log` records carry their own module, file and line, so no stack walking
//! happens on this path. Lines name the macro inside the record's module, as
//! in `app::cache::warn!()`, since the calling function is unknown.
use std::path::Path;

use anyhow::{Context, Result};
use log::{Level, LevelFilter, Metadata, Record};

use crate::{
    context::{CallerInfo, UNKNOWN, basename},
    level::Severity,
    logger::Logger,
};

/// `Trace` has no counterpart and maps to [`Severity::Debug`].
pub const fn severity_of(level: Level) -> Severity {
    match level {
        Level::Error => Severity::Error,
        Level::Warn => Severity::Warn,
        Level::Info => Severity::Info,
        Level::Debug | Level::Trace => Severity::Debug,
    }
}

fn caller_of(record: &Record<'_>) -> CallerInfo {
    let function = record.module_path().map_or_else(
        || UNKNOWN.to_owned(),
        |module| format!("{module}::{}!", record.level().as_str().to_ascii_lowercase()),
    );

    CallerInfo::new(
        function,
        record.file().map_or_else(|| UNKNOWN.to_owned(), |file| basename(Path::new(file))),
        record.line().map_or(-1, i64::from),
    )
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        Self::enabled(self, severity_of(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        let severity = severity_of(record.level());
        if !Self::enabled(self, severity) {
            return;
        }

        self.write_line(severity, &record.args().to_string(), &caller_of(record));
    }

    fn flush(&self) {
        let _ = Self::flush(self);
    }
}

/// Installs `logger` as the `log` backend.
///
/// Filtering stays with the logger's threshold, so later threshold changes
/// apply to `log` macros too.
pub fn install(logger: &'static Logger) -> Result<()> {
    log::set_logger(logger).context("Failed to install the log bridge")?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use log::{Level, Log, Record};

    use super::{caller_of, severity_of};
    use crate::{level::Severity, logger::Logger, sink::MemorySink};

    #[test]
    fn root_module_records_name_the_macro() {
        let record = Record::builder()
            .level(Level::Info)
            .args(format_args!("ready"))
            .module_path(Some("tintlog"))
            .build();

        let caller = caller_of(&record);
        assert_eq!(caller.function, "tintlog::info!");
        assert_eq!(caller.file, "???");
        assert_eq!(caller.line, -1);
    }

    #[test]
    fn levels_map_onto_severities() {
        assert_eq!(severity_of(Level::Error), Severity::Error);
        assert_eq!(severity_of(Level::Info), Severity::Info);
        assert_eq!(severity_of(Level::Trace), Severity::Debug);
    }

    #[test]
    fn records_keep_their_location() -> anyhow::Result<()> {
        let sink = MemorySink::new();
        let logger = Logger::builder().writer(sink.clone()).isolated(Severity::Info).build()?;

        logger.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("cache miss for {}", 7))
                .module_path(Some("app::cache"))
                .file(Some("src/cache.rs"))
                .line(Some(88))
                .build(),
        );
        logger.log(&Record::builder().level(Level::Debug).args(format_args!("hidden")).build());

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[Warn] Thread"));
        assert!(lines[0].contains(": cache miss for 7 app::cache::warn!():cache.rs:88 {git:"), "{}", lines[0]);
        assert!(!Log::enabled(&logger, &log::Metadata::builder().level(Level::Trace).build()));
        Ok(())
    }
}
