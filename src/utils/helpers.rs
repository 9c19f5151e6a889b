/// Formatting helpers shared by the dashboard and the CLI output

use chrono::{DateTime, Local, Utc};

use crate::utils::constants::{USAGE_CRITICAL_PERCENT, USAGE_WARN_PERCENT};

/// Format a megabyte figure, switching to GB above 1024 MB
pub fn format_mb(mb: f64) -> String {
    if mb >= 1024.0 {
        format!("{:.2} GB", mb / 1024.0)
    } else {
        format!("{:.1} MB", mb)
    }
}

/// `used / total GB`
pub fn format_gb_pair(used_gb: f64, total_gb: f64) -> String {
    format!("{:.1}/{:.1} GB", used_gb, total_gb)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format duration to human-readable string
pub fn format_duration(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// How long ago an RFC3339 `created` timestamp was, e.g. "3h 12m ago"
///
/// Returns the input unchanged when it does not parse.
pub fn format_age(created: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(created) {
        Ok(created_at) => {
            let elapsed = now.signed_duration_since(created_at.with_timezone(&Utc));
            let seconds = elapsed.num_seconds().max(0) as u64;
            format!("{} ago", format_duration(seconds))
        }
        Err(_) => created.to_string(),
    }
}

/// Local wall-clock time for "last updated" labels
pub fn format_clock(at: DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Truncate string with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Docker ids are shown with the usual 12 characters
pub fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

/// Severity band of a usage percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

impl UsageLevel {
    pub fn of(percent: f64) -> Self {
        if percent > USAGE_CRITICAL_PERCENT {
            UsageLevel::Critical
        } else if percent > USAGE_WARN_PERCENT {
            UsageLevel::Warning
        } else {
            UsageLevel::Normal
        }
    }
}

/// Parse Docker container status to simplified state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Created,
    Stopped,
    Paused,
    Restarting,
    Dead,
    Unknown,
}

impl From<&str> for ContainerState {
    fn from(status: &str) -> Self {
        let status_lower = status.to_lowercase();
        if status_lower.contains("paused") {
            ContainerState::Paused
        } else if status_lower.contains("restarting") {
            ContainerState::Restarting
        } else if status_lower.starts_with("up") || status_lower.contains("running") {
            ContainerState::Running
        } else if status_lower.contains("dead") || status_lower.contains("removing") {
            ContainerState::Dead
        } else if status_lower.contains("exited") || status_lower.contains("stopped") {
            ContainerState::Stopped
        } else if status_lower.contains("created") {
            ContainerState::Created
        } else {
            ContainerState::Unknown
        }
    }
}

impl ContainerState {
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerState::Running => "Running",
            ContainerState::Created => "Created",
            ContainerState::Stopped => "Stopped",
            ContainerState::Paused => "Paused",
            ContainerState::Restarting => "Restarting",
            ContainerState::Dead => "Dead",
            ContainerState::Unknown => "Unknown",
        }
    }
}
