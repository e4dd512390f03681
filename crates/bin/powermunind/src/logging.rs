//! Tracing subscriber setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("log file path has no file name: {0}")]
    FileName(String),
    #[error("failed to install log subscriber")]
    Init(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Install the global subscriber.
///
/// When a log file is configured the returned guard must be kept alive until
/// exit so buffered lines are flushed.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid, the log file path is
/// unusable, or a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_new(config.directive())?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &config.file {
        Some(path) => {
            let (directory, file_name) = split(path)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            builder
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(LoggingError::Init)?;
            Ok(Some(guard))
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(LoggingError::Init)?;
            Ok(None)
        }
    }
}

fn split(path: &Path) -> Result<(&Path, &std::ffi::OsStr), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::FileName(path.display().to_string()))?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((directory, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_split_log_path() {
        let (directory, file_name) = split(Path::new("/var/log/powermunin.log")).unwrap();
        assert_eq!(directory, Path::new("/var/log"));
        assert_eq!(file_name, "powermunin.log");
    }

    #[test]
    fn should_default_to_current_directory() {
        let (directory, _) = split(Path::new("powermunin.log")).unwrap();
        assert_eq!(directory, Path::new("."));
    }

    #[test]
    fn should_reject_path_without_file_name() {
        assert!(matches!(
            split(Path::new("/")),
            Err(LoggingError::FileName(_))
        ));
    }

    #[test]
    fn should_reject_invalid_filter() {
        let config = LoggingConfig {
            filter: Some("powermunin=loud".to_string()),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config), Err(LoggingError::Filter(_))));
    }
}
