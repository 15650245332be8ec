//! Transient, non-blocking user notifications

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Keep at most this many undrained notifications
const CAPACITY: usize = 64;

pub(crate) const LOAD_FIRST: &str = "Please load an image first";
pub(crate) const SELECT_TOOL_FIRST: &str = "Please select a processing tool first";
pub(crate) const BATCH_LIMIT: &str = "Maximum 10 images allowed for batch processing";
pub(crate) const WAIT_FOR_CURRENT: &str = "Please wait for the current operation to finish";
pub(crate) const NOTHING_TO_UNDO: &str = "Nothing to undo";
pub(crate) const NOTHING_TO_REDO: &str = "Nothing to redo";
pub(crate) const NO_SUCH_ENTRY: &str = "History entry out of range";
pub(crate) const NO_SUCH_PENDING: &str = "No pending image at that position";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Success => "ok",
            Level::Warning => "warn",
            Level::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Bounded FIFO of pending notifications; the oldest drop first
#[derive(Debug, Default)]
pub(crate) struct Notifications {
    queue: VecDeque<Notification>,
}

impl Notifications {
    pub(crate) fn push(&mut self, level: Level, message: impl Into<String>) {
        if self.queue.len() == CAPACITY {
            self.queue.pop_front();
        }
        self.queue.push_back(Notification {
            level,
            message: message.into(),
        });
    }

    pub(crate) fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub(crate) fn warning(&mut self, message: impl Into<String>) {
        self.push(Level::Warning, message);
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    pub(crate) fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }
}
