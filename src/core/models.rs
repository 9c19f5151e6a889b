/// Wire types for the container-management API
///
/// Field names follow the backend's JSON exactly so serde needs no renames.

use serde::{Deserialize, Serialize};

use crate::utils::ContainerState;

/// A container as listed by `GET /api/v1/containers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub status: String,
    pub state: StateField,
    pub image: String,
    #[serde(default)]
    pub ports: Vec<String>,
    pub created: String,
    pub running: bool,
}

impl Container {
    /// Simplified state for display
    ///
    /// `running` decides between running and not running, matching the
    /// status filter. The state text only refines a container that is not
    /// running (exited, created, dead, ...).
    pub fn state_kind(&self) -> ContainerState {
        if self.running {
            return ContainerState::Running;
        }

        let from_text = match &self.state {
            StateField::Text(text) => ContainerState::from(text.as_str()),
            StateField::Detail(_) => ContainerState::from(self.status.as_str()),
        };
        match from_text {
            ContainerState::Running => ContainerState::Stopped,
            other => other,
        }
    }

    /// Comma-separated port mappings, or "-" when nothing is published
    pub fn ports_label(&self) -> String {
        if self.ports.is_empty() {
            "-".to_string()
        } else {
            self.ports.join(", ")
        }
    }
}

/// The backend sends `state` either as a plain word or as Docker's state object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateField {
    Text(String),
    Detail(serde_json::Map<String, serde_json::Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub cpu_percent: f64,
    pub memory_usage_mb: f64,
    pub memory_limit_mb: f64,
    pub memory_percent: f64,
    pub network_rx_mb: f64,
    pub network_tx_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerLogs {
    pub container: String,
    pub lines: Vec<String>,
    pub tail: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub total_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
}

/// Host resource usage from `GET /api/v1/system/metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f64,
    pub memory: UsageInfo,
    pub disk: UsageInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub docker_connected: bool,
    pub timestamp: String,
    pub version: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Result body of a start/stop/restart/rebuild call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_container_accepts_text_state() {
        let container: Container = serde_json::from_value(json!({
            "id": "abc123def456",
            "name": "local-postgres",
            "status": "running",
            "state": "running",
            "image": "postgres:17",
            "ports": ["5432:5432/tcp"],
            "created": "2025-10-29T10:00:00Z",
            "running": true
        }))
        .unwrap();

        assert_eq!(container.state, StateField::Text("running".to_string()));
        assert!(container.state_kind().is_running());
        assert_eq!(container.ports_label(), "5432:5432/tcp");
    }

    #[test]
    fn test_container_accepts_object_state_and_missing_ports() {
        let container: Container = serde_json::from_value(json!({
            "id": "abc",
            "name": "local-redis",
            "status": "exited",
            "state": {"Status": "exited", "ExitCode": 0},
            "image": "redis:7",
            "created": "2025-10-29T10:00:00Z",
            "running": false
        }))
        .unwrap();

        assert!(matches!(container.state, StateField::Detail(_)));
        assert_eq!(container.state_kind(), ContainerState::Stopped);
        assert_eq!(container.ports_label(), "-");
    }

    #[test]
    fn test_state_follows_running_flag() {
        let mut container: Container = serde_json::from_value(json!({
            "id": "abc",
            "name": "local-minio",
            "status": "Up 3 hours",
            "state": "running",
            "image": "minio/minio",
            "created": "2025-10-29T10:00:00Z",
            "running": false
        }))
        .unwrap();
        assert_eq!(container.state_kind(), ContainerState::Stopped);

        container.state = StateField::Text("created".to_string());
        assert_eq!(container.state_kind(), ContainerState::Created);

        container.running = true;
        container.state = StateField::Text("exited".to_string());
        assert_eq!(container.state_kind(), ContainerState::Running);
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus = serde_json::from_value(json!({
            "status": "healthy",
            "docker_connected": true,
            "timestamp": "2025-10-29T20:42:25.695125",
            "version": "2.0.0"
        }))
        .unwrap();
        assert!(health.is_healthy());
    }
}
