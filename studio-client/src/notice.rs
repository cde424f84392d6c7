//! Transient notices shown next to the persistent agent statuses.

use std::time::Duration;

use tokio::time::Instant;

pub const NOTICE_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "✓",
            NoticeLevel::Error => "✗",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            duration: NOTICE_DURATION,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Error)
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

#[derive(Debug)]
pub struct NoticeQueue {
    notices: Vec<Notice>,
    max_visible: usize,
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self {
            notices: Vec::new(),
            max_visible: 5,
        }
    }

    pub fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notice::success(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notice::error(message));
    }

    /// Drop expired notices and return the newest live ones, newest first.
    pub fn active(&mut self) -> Vec<Notice> {
        self.notices.retain(|n| !n.is_expired());
        self.notices
            .iter()
            .rev()
            .take(self.max_visible)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
