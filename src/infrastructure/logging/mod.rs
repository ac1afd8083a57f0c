use chrono::Local;
use env_logger::Builder;
use log::{LevelFilter, Record};
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use std::time::{Duration, SystemTime};

pub const ENABLE_LOGS_ENV: &str = "DEVFLEET_ENABLE_LOGS";
pub const RETENTION_HOURS_ENV: &str = "DEVFLEET_LOG_RETENTION_HOURS";

const DEFAULT_RETENTION: Duration = Duration::from_secs(72 * 3_600);

static INIT: Once = Once::new();
static FILE_SINK: Mutex<Option<BufWriter<File>>> = Mutex::new(None);

#[derive(Debug)]
struct LogSettings {
    to_file: bool,
    retention: Duration,
    dir: PathBuf,
    /// Problems found before the logger exists; emitted right after init.
    pending: Vec<String>,
}

pub fn get_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("devfleet")
        .join("logs")
}

/// Sets up the global logger once per process. Records go to stderr and,
/// when file logging is on, to a timestamped file under [`get_log_dir`].
/// Stdout stays free for command replies.
pub fn init_logging() {
    INIT.call_once(|| {
        let mut settings = read_settings();
        let log_file = if settings.to_file {
            open_log_file(&mut settings)
        } else {
            None
        };

        build_logger(settings.to_file).init();

        log::info!(
            "devfleet v{} starting (pid {})",
            env!("CARGO_PKG_VERSION"),
            std::process::id()
        );
        match &log_file {
            Some(path) => log::info!("Log file: {}", path.display()),
            None => log::debug!("File logging disabled"),
        }
        for message in settings.pending {
            log::warn!("{message}");
        }
    });
}

fn build_logger(to_file: bool) -> Builder {
    let mut builder = Builder::new();
    if cfg!(test) {
        builder.is_test(true);
    }

    match env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) if to_file => {
            builder
                .filter_level(LevelFilter::Warn)
                .filter_module("devfleet", LevelFilter::Debug);
        }
        Err(_) => {
            builder.filter_level(LevelFilter::Warn);
        }
    }

    builder
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            let line = format_record(record);
            writeln!(buf, "{line}")?;
            mirror_to_file(&line);
            Ok(())
        });
    builder
}

/// `[2024-05-01 10:20:30.123 INFO  devfleet::fleet] message`
fn format_record(record: &Record<'_>) -> String {
    format!(
        "[{} {:<5} {}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.target(),
        record.args()
    )
}

fn mirror_to_file(line: &str) {
    let Ok(mut sink) = FILE_SINK.lock() else {
        return;
    };
    if let Some(writer) = sink.as_mut() {
        let _ = writeln!(writer, "{line}").and_then(|()| writer.flush());
    }
}

/// Prunes old logs and opens a fresh file. Failures downgrade to
/// console-only logging with a pending warning.
fn open_log_file(settings: &mut LogSettings) -> Option<PathBuf> {
    if let Err(e) = fs::create_dir_all(&settings.dir) {
        settings.pending.push(format!(
            "Cannot create log directory {}: {e}",
            settings.dir.display()
        ));
        return None;
    }

    let removal_failures = cleanup_old_logs(&settings.dir, settings.retention);
    settings.pending.extend(removal_failures);

    let path = settings.dir.join(format!(
        "devfleet-{}.log",
        Local::now().format("%Y%m%d-%H%M%S")
    ));
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            if let Ok(mut sink) = FILE_SINK.lock() {
                *sink = Some(BufWriter::new(file));
            }
            Some(path)
        }
        Err(e) => {
            settings.pending.push(format!(
                "Cannot open log file {}: {e}; logging to stderr only",
                path.display()
            ));
            None
        }
    }
}

fn read_settings() -> LogSettings {
    let mut pending = Vec::new();

    let retention = match env::var(RETENTION_HOURS_ENV) {
        Err(_) => DEFAULT_RETENTION,
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(hours) => Duration::from_secs(hours.saturating_mul(3_600)),
            Err(_) => {
                pending.push(format!(
                    "Ignoring {RETENTION_HOURS_ENV}={raw:?}: not a whole number of hours"
                ));
                DEFAULT_RETENTION
            }
        },
    };

    let default_to_file = cfg!(debug_assertions);
    let to_file = match env::var(ENABLE_LOGS_ENV) {
        Err(_) => default_to_file,
        Ok(raw) => parse_bool(&raw).unwrap_or_else(|| {
            pending.push(format!(
                "Ignoring {ENABLE_LOGS_ENV}={raw:?}: expected a boolean"
            ));
            default_to_file
        }),
    };

    LogSettings {
        to_file,
        retention,
        dir: get_log_dir(),
        pending,
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Deletes `*.log` files in `dir` last modified before the retention
/// window. Returns one message per file that could not be handled.
fn cleanup_old_logs(dir: &Path, retention: Duration) -> Vec<String> {
    let Some(cutoff) = (!retention.is_zero())
        .then(|| SystemTime::now().checked_sub(retention))
        .flatten()
    else {
        return Vec::new();
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "log"))
        .filter_map(|path| match remove_if_older(&path, cutoff) {
            Ok(()) => None,
            Err(e) => Some(format!("Cannot prune old log {}: {e}", path.display())),
        })
        .collect()
}

fn remove_if_older(path: &Path, cutoff: SystemTime) -> io::Result<()> {
    if fs::metadata(path)?.modified()? < cutoff {
        fs::remove_file(path)?;
    }
    Ok(())
}
