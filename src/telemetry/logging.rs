//! Logging setup for hosts without their own subscriber
//!
//! The library only emits `tracing` events under `foilcard::*` targets.
//! [`init_logging`] installs a registry with an env filter and up to two
//! sinks, console and file, both written in the same [`LogFormat`].

use std::path::PathBuf;

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*, Layer, Registry};

use crate::error::LogError;

/// Keeps the non-blocking file writer flushing; hold it for the session.
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;

/// Filter variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "FOILCARD_LOG";

/// Set to `json` to override the configured format
pub const LOG_FORMAT_ENV: &str = "FOILCARD_LOG_FORMAT";

type Sink = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human output
    #[default]
    Compact,
    /// One JSON object per event, with file and line
    Json,
}

impl LogFormat {
    /// Format named by an override value; anything but `json` keeps `fallback`.
    pub fn from_override(value: Option<&str>, fallback: LogFormat) -> LogFormat {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("compact") => LogFormat::Compact,
            _ => fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Filter directive used when neither env variable is set
    pub level: String,
    pub format: LogFormat,
    pub console: bool,
    /// Also write to this file (parent directories are created)
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::with_level("info")
    }
}

impl LogConfig {
    /// Console logging at the given filter directive
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Compact,
            console: true,
            file: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    fn effective_format(&self) -> LogFormat {
        LogFormat::from_override(std::env::var(LOG_FORMAT_ENV).ok().as_deref(), self.format)
    }
}

fn sink<W>(writer: W, format: LogFormat, ansi: bool) -> Sink
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_target(true).with_ansi(ansi);
    match format {
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().with_file(true).with_line_number(true).boxed(),
    }
}

/// Install the global subscriber.
///
/// Returns the file writer guard when file logging is on. Fails when the
/// log file cannot be created or a subscriber is already installed.
///
/// ```no_run
/// use foilcard::telemetry::{init_logging, LogConfig};
///
/// let _guard = init_logging(&LogConfig::with_level("foilcard=debug"))?;
/// # Ok::<(), foilcard::LogError>(())
/// ```
pub fn init_logging(config: &LogConfig) -> Result<Option<LogGuard>, LogError> {
    let format = config.effective_format();
    let mut sinks: Vec<Sink> = Vec::new();
    let mut guard = None;

    if config.console {
        sinks.push(sink(std::io::stderr, format, true));
    }

    if let Some(path) = &config.file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LogError::File {
                path: path.clone(),
                source,
            })?;
        }
        let file = std::fs::File::create(path).map_err(|source| LogError::File {
            path: path.clone(),
            source,
        })?;
        let (writer, file_guard) = tracing_appender::non_blocking(file);
        sinks.push(sink(writer, format, false));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry().with(sinks).with(config.filter()).try_init()?;

    tracing::info!(
        target: "foilcard",
        version = env!("CARGO_PKG_VERSION"),
        format = ?format,
        file = ?config.file,
        "Logging initialized"
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert!(config.console);
        assert!(config.file.is_none());
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_log_config_builders() {
        let config = LogConfig::with_level("debug").with_file("/tmp/foilcard.log").json();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/foilcard.log")));
    }

    #[test]
    fn test_format_override() {
        assert_eq!(LogFormat::from_override(Some("JSON"), LogFormat::Compact), LogFormat::Json);
        assert_eq!(LogFormat::from_override(Some(" compact "), LogFormat::Json), LogFormat::Compact);
        assert_eq!(LogFormat::from_override(Some("pretty"), LogFormat::Json), LogFormat::Json);
        assert_eq!(LogFormat::from_override(None, LogFormat::Compact), LogFormat::Compact);
    }

    // The only test in this binary that installs the global subscriber
    #[test]
    fn test_init_writes_file_once() {
        let dir = std::env::temp_dir().join(format!("foilcard-log-{}", std::process::id()));
        let path = dir.join("nested").join("foilcard.log");
        let config = LogConfig {
            console: false,
            ..LogConfig::with_level("info").with_file(&path)
        };

        let guard = init_logging(&config).unwrap();
        assert!(guard.is_some());
        tracing::info!(target: "foilcard", "written to file");
        drop(guard);
        assert!(path.exists());

        let again = init_logging(&LogConfig::with_level("info"));
        assert!(matches!(again, Err(LogError::Init(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
