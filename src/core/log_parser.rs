/// Parsing of container log lines for the logs view
///
/// The API returns lines as Docker prints them with timestamps enabled:
/// `2025-10-29T10:00:00.123456789Z message`. The timestamp is split off and
/// the level is guessed from the message so the view can colour it.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Other,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN ",
            LogLevel::Info => "INFO ",
            LogLevel::Debug => "DEBUG",
            LogLevel::Other => "     ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLogLine {
    pub timestamp: Option<String>,
    pub level: LogLevel,
    pub message: String,
}

/// Detect the level keyword common to postgres, redis, python and rust loggers
pub fn detect_level(message: &str) -> LogLevel {
    static LEVEL_RE: OnceLock<Regex> = OnceLock::new();

    let level_re = LEVEL_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(fatal|panic|error|err|critical|warn|warning|info|notice|log|debug|trace)\b")
            .unwrap()
    });

    match level_re
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .as_deref()
    {
        Some("fatal" | "panic" | "error" | "err" | "critical") => LogLevel::Error,
        Some("warn" | "warning") => LogLevel::Warn,
        Some("info" | "notice" | "log") => LogLevel::Info,
        Some("debug" | "trace") => LogLevel::Debug,
        _ => LogLevel::Other,
    }
}

pub fn parse_log_line(line: &str) -> ParsedLogLine {
    static TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();

    let timestamp_re = TIMESTAMP_RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2}))\s?(.*)$")
            .unwrap()
    });

    let line = line.trim_end_matches(['\r', '\n']);

    let (timestamp, message) = match timestamp_re.captures(line) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).map(|m| m.as_str()).unwrap_or_default().to_string(),
        ),
        None => (None, line.to_string()),
    };

    ParsedLogLine {
        timestamp,
        level: detect_level(&message),
        message,
    }
}

/// Shorten a Docker timestamp to `HH:MM:SS` for display
pub fn format_timestamp_compact(timestamp: &str) -> String {
    timestamp
        .split_once('T')
        .map(|(_, time)| time.chars().take(8).collect())
        .unwrap_or_else(|| timestamp.to_string())
}
