//! Narrow contracts with the host environment.
//!
//! The core reads rules, loads and stores one document, and emits user
//! notifications; everything else (config storage, privileges, UI) stays
//! on the host side. Implementations are provided by the embedding
//! binary.

use std::io;

/// Notification severity shown to the user. Never consulted for control
/// flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

/// User-feedback channel.
pub trait NotificationSink {
    fn notify(&self, kind: NotificationKind, message: &str, detail: &str, duration_ms: u32);
}

/// Reads the raw rule-file content from wherever the host keeps it. The
/// configured location is the implementation's concern.
pub trait RuleSource {
    fn read(&self) -> io::Result<String>;
}

/// The document being treated: exposes its current text content and
/// accepts a full-content replacement.
pub trait DocumentStore {
    fn load(&self) -> io::Result<String>;
    fn store(&self, content: &str) -> io::Result<()>;
}
