/// Names, environment variables and defaults shared across the CLI

use std::time::Duration;

pub const APP_NAME: &str = "localplace-cli";
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Log file written in TUI mode, next to config.toml
pub const LOG_FILE_NAME: &str = "localplace-cli.log";

/// Environment overrides
pub const ENV_API_URL: &str = "LOCALPLACE_API_URL";
pub const ENV_HEALTH_INTERVAL: &str = "LOCALPLACE_HEALTH_INTERVAL";
pub const ENV_METRICS_INTERVAL: &str = "LOCALPLACE_METRICS_INTERVAL";
pub const ENV_CONTAINERS_INTERVAL: &str = "LOCALPLACE_CONTAINERS_INTERVAL";
pub const ENV_STATS_INTERVAL: &str = "LOCALPLACE_STATS_INTERVAL";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Start/stop/restart/rebuild block until Docker finishes; rebuilds pull images
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(300);

pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CONTAINERS_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(5);

pub const DEFAULT_LOG_TAIL: usize = 100;
/// Largest `tail` the backend accepts
pub const MAX_LOG_TAIL: usize = 1000;

/// Usage thresholds for colour coding (percent)
pub const USAGE_WARN_PERCENT: f64 = 60.0;
pub const USAGE_CRITICAL_PERCENT: f64 = 80.0;
