//! Tracing subscriber setup

use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::schema::LoggingConfig;
use crate::utils::expand_tilde;

/// Rolling log file prefix; files are named `ncuacg-chat.log.YYYY-MM-DD`
const LOG_FILE_PREFIX: &str = "ncuacg-chat.log";

const LOG_RETENTION: Duration = Duration::from_secs(7 * 24 * 3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn resolve(config: &LoggingConfig) -> Self {
        let raw = std::env::var("LOG_FORMAT").unwrap_or_else(|_| config.format.clone());
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Initialize the logging system
///
/// Console output goes to stderr so it never interleaves with chat
/// transcripts printed on stdout. The returned guard must be held for the
/// lifetime of the process or buffered file output is lost.
pub fn init_logging(config: &LoggingConfig) -> WorkerGuard {
    let format = LogFormat::resolve(config);
    let log_dir = expand_tilde(&config.dir);

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));

    Registry::default()
        .with(build_filter(config))
        .with(output_layer(format, std::io::stderr, true))
        .with(output_layer(format, file_writer, false))
        .init();

    if let Err(e) = prune_logs(&log_dir, LOG_RETENTION) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    guard
}

/// `RUST_LOG` when set, else the configured level plus per-module overrides
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    for (module, level) in &config.overrides {
        match format!("{}={}", module, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(_) => eprintln!("Invalid log directive: {}={}", module, level),
        }
    }
    filter
}

fn output_layer<S, W>(
    format: LogFormat,
    writer: W,
    console: bool,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    // Source locations only help in the persisted file.
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(console)
        .with_file(!console)
        .with_line_number(!console);

    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Text => layer.boxed(),
    }
}

/// Delete rolled log files whose last write is older than `max_age`
fn prune_logs(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let ours = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX));
        if !ours || !path.is_file() {
            continue;
        }

        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > max_age);
        if expired {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("Failed to remove old log file {}: {}", path.display(), e),
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prune_keeps_fresh_and_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let fresh = temp_dir.path().join("ncuacg-chat.log.2026-10-15");
        let foreign = temp_dir.path().join("notes.txt");
        std::fs::write(&fresh, "log").unwrap();
        std::fs::write(&foreign, "keep").unwrap();

        assert_eq!(prune_logs(temp_dir.path(), LOG_RETENTION).unwrap(), 0);
        assert!(fresh.exists());
        assert!(foreign.exists());
    }

    #[test]
    fn test_prune_removes_expired_logs() {
        let temp_dir = TempDir::new().unwrap();
        let old = temp_dir.path().join("ncuacg-chat.log.2026-01-01");
        std::fs::write(&old, "log").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(prune_logs(temp_dir.path(), Duration::from_millis(1)).unwrap(), 1);
        assert!(!old.exists());
    }

    #[test]
    fn test_prune_missing_dir_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(
            prune_logs(&temp_dir.path().join("missing"), LOG_RETENTION).unwrap(),
            0
        );
    }
}
