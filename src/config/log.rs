use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

/// Log section of the generated document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Log {
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<bool>,
}

impl Log {
    pub fn new(level: LogLevel, timestamp: bool) -> Self {
        Self {
            disabled: false,
            level: Some(level),
            timestamp: Some(timestamp),
        }
    }
}

/// sing-box log level
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}
