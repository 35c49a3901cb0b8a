//! Run log for the `buildstep` binary.
//!
//! Each run of the binary truncates `buildstep.log` under the user data
//! directory (`$XDG_DATA_HOME/buildstep`, `%APPDATA%\buildstep`, or
//! `~/Library/Application Support/buildstep`) and records which document was
//! opened, every step change and any error reported to the user.
//!
//! Library code logs through `log_info!` / `log_warn!` / `log_err!`. Until
//! the binary calls [`init`], or when `session_log=false` is set, the macros
//! are no-ops.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

static SINK: OnceLock<Sink> = OnceLock::new();

struct Sink {
    path: PathBuf,
    file: Mutex<File>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Where this run is logging, if anywhere.
pub fn log_path() -> Option<&'static Path> {
    SINK.get().map(|s| s.path.as_path())
}

/// Append one `[HH:MM:SS] [LEVEL] msg` line. Write failures are dropped.
pub fn log(level: Level, msg: &str) {
    append(&format!("[{}] [{}] {}", clock(), level.tag(), msg));
}

fn append(line: &str) {
    if let Some(sink) = SINK.get()
        && let Ok(mut file) = sink.file.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Error, &format!($($arg)*))
    };
}

/// Start logging to the per-user log file.
pub fn init() {
    init_at(&data_dir().join("buildstep").join("buildstep.log"));
}

/// Start logging to `path`, truncating it. Later calls are ignored.
///
/// Panics are mirrored into the log before the previous hook runs.
pub fn init_at(path: &Path) {
    if SINK.get().is_some() {
        return;
    }
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).write(true).truncate(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("warning: cannot write log {}: {}", path.display(), e);
            return;
        }
    };
    let _ = SINK.set(Sink {
        path: path.to_path_buf(),
        file: Mutex::new(file),
    });

    append(&format!(
        "=== buildstep {} run at unix {} ===",
        env!("CARGO_PKG_VERSION"),
        unix_secs().unwrap_or(0)
    ));

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        append(&format!("[{}] [PANIC] {}", clock(), info));
        prev(info);
    }));
}

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
            return PathBuf::from(home).join("Library").join("Application Support");
        }
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local").join("share")))
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn unix_secs() -> Option<u64> {
    SystemTime::now().duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

/// Time of day (UTC) as HH:MM:SS.
fn clock() -> String {
    match unix_secs() {
        Some(secs) => format!(
            "{:02}:{:02}:{:02}",
            (secs % 86400) / 3600,
            (secs % 3600) / 60,
            secs % 60
        ),
        None => "??:??:??".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_shape() {
        let ts = clock();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.as_bytes()[2], b':');
        assert_eq!(ts.as_bytes()[5], b':');
    }

    #[test]
    fn macros_work_in_expression_position() {
        let outcome: Option<i64> = None;
        match outcome {
            Some(v) => crate::log_info!("got {}", v),
            None => crate::log_warn!("nothing"),
        }
        let _unit: () = crate::log_err!("done");
    }

    #[test]
    fn logging_writes_to_the_run_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        init_at(&path);
        assert_eq!(log_path(), Some(path.as_path()));

        crate::log_warn!("hello {}", 42);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("=== buildstep"));
        assert!(content.contains("[WARN] hello 42"));
    }
}
