use heapless::HistoryBuffer;
use serde::Serialize;

use crate::config::STATUS_LOG_LEN;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warning,
    Alert,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub at_ms: u64,
    pub level: StatusLevel,
    pub message: String,
}

/// User-facing trip log, mirrored to the `log` facade.
pub struct StatusLog {
    entries: HistoryBuffer<StatusEntry, STATUS_LOG_LEN>,
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLog {
    pub const fn new() -> Self {
        Self {
            entries: HistoryBuffer::new(),
        }
    }

    pub fn push(&mut self, at_ms: u64, level: StatusLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            StatusLevel::Info => log::info!("{message}"),
            StatusLevel::Warning => log::warn!("{message}"),
            StatusLevel::Alert => log::error!("{message}"),
        }
        self.entries.write(StatusEntry {
            at_ms,
            level,
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self) -> Option<&StatusEntry> {
        self.entries.recent()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.oldest_ordered()
    }

    pub fn contains(&self, level: StatusLevel, message: &str) -> bool {
        self.iter()
            .any(|entry| entry.level == level && entry.message == message)
    }
}
