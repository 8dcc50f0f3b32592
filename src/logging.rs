use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::PathBuf,
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use serde_json::json;

pub const LOG_JSON_PATH_ENV: &str = "REFLEX_LOG_JSON_PATH";

/// `log` backend: plain lines on stderr plus an optional JSON-lines file.
pub struct HostLogger {
    level: LevelFilter,
    json_file: Mutex<Option<File>>,
}

impl HostLogger {
    pub fn from_env(level: LevelFilter) -> Result<Self> {
        let path = std::env::var(LOG_JSON_PATH_ENV).ok();
        Self::new(level, path.map(PathBuf::from))
    }

    pub fn new(level: LevelFilter, path: Option<PathBuf>) -> Result<Self> {
        let json_file = match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("opening {}", path.display()))?;
                Some(file)
            }
            None => None,
        };
        Ok(Self {
            level,
            json_file: Mutex::new(json_file),
        })
    }

    pub fn install(self) -> Result<()> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self)).context("logger already installed")?;
        log::set_max_level(level);
        Ok(())
    }

    fn event(&self, level: &str, target: &str, message: &str) {
        let Ok(mut guard) = self.json_file.lock() else {
            return;
        };
        let Some(file) = guard.as_mut() else {
            return;
        };

        let ts_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let entry = json!({
            "ts_ms": ts_ms,
            "level": level,
            "target": target,
            "msg": message,
        });

        let _ = writeln!(file, "{}", entry);
        let _ = file.flush();
    }
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = record.level().as_str().to_ascii_lowercase();
        let message = record.args().to_string();
        eprintln!("[{:<5}] {}", record.level(), message);
        self.event(&level, record.target(), &message);
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.json_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}
