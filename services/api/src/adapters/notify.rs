//! services/api/src/adapters/notify.rs
//!
//! The user-visible notification channel: a bounded per-page buffer that the
//! task page drains on render, backed by `tracing` so nothing is lost when
//! no page is looking.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

use task_tracker_core::ports::{Notifier, Severity};

/// How many undrained notices one page keeps before the oldest fall off.
const NOTICE_CAPACITY: usize = 16;

/// One notice as the page surface renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: String,
    pub message: String,
}

/// A bounded notice queue for one page. Cheap to share: the web layer holds
/// it next to the page's view-model and drains it on every render.
#[derive(Default)]
pub struct NoticeBuffer {
    notices: Mutex<VecDeque<Notice>>,
}

impl NoticeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut notices) => notices.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Notifier for NoticeBuffer {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }

        let severity = match severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        if let Ok(mut notices) = self.notices.lock() {
            if notices.len() == NOTICE_CAPACITY {
                notices.pop_front();
            }
            notices.push_back(Notice {
                severity: severity.to_string(),
                message: message.to_string(),
            });
        }
    }
}
