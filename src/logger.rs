//! Session logger: backs the `log` facade with a single file in the OS data
//! directory.
//!
//! The file is **truncated at each launch**, so it only ever contains output
//! from the most recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\Pixelsmith\pixelsmith.log`
//!   Linux:    `~/.local/share/Pixelsmith/pixelsmith.log`
//!   macOS:    `~/Library/Application Support/Pixelsmith/pixelsmith.log`
//!
//! Anywhere in the crate use `log::info!` / `log::warn!` / `log::error!`.
//! Warnings and errors are mirrored to stderr.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};

static LOGGER: SessionLogger = SessionLogger;
static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();

struct SessionLogger;

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), &record.args().to_string());
        if record.level() <= Level::Warn {
            eprintln!("{}", line);
        }
        write_line(&line);
    }

    fn flush(&self) {
        if let Some(mutex) = LOG_FILE.get()
            && let Ok(mut file) = mutex.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Write a raw line to the session log. I/O errors are swallowed so logging
/// never takes the editor down.
fn write_line(line: &str) {
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

fn format_line(level: Level, msg: &str) -> String {
    format!("[{}] [{}] {}", timestamp(), level, msg)
}

/// Initialise the session logger at the default location.
pub fn init(level: LevelFilter) {
    init_at(&log_file_path(), level);
}

/// Initialise the session logger writing to `path`.
///
/// * Creates (or truncates) the log file. Failure to open it is not fatal;
///   records still reach stderr.
/// * Registers the logger with the `log` facade (first call wins).
/// * Installs a panic hook that writes the panic message to the log before
///   running the previous hook.
pub fn init_at(path: &Path, level: LevelFilter) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
    {
        Ok(f) => {
            let _ = LOG_FILE.set(Mutex::new(f));
        }
        Err(e) => eprintln!("[logger] Failed to open log file {:?}: {}", path, e),
    }

    if log::set_logger(&LOGGER).is_err() {
        return;
    }
    log::set_max_level(level);

    write_line(&format!(
        "=== Pixelsmith session started (unix {}) ===",
        unix_seconds()
    ));
    write_line(&format!("Log file: {}", path.display()));

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write_line(&format_line(Level::Error, &format!("PANIC: {}", info)));
        prev(info);
    }));
}

fn log_file_path() -> PathBuf {
    data_dir().join("Pixelsmith").join("pixelsmith.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// `HH:MM:SS` within the current UTC day.
fn timestamp() -> String {
    let secs = unix_seconds();
    format!(
        "{:02}:{:02}:{:02}",
        (secs % 86400) / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
