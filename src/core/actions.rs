/// Container start/stop/restart/rebuild, singly or across every container
///
/// An action waits for the API to confirm, then refreshes the container list
/// so the dashboard always shows server state. Nothing is updated
/// optimistically.

use std::fmt;
use tracing::{info, warn};

use crate::core::api::{ApiClient, ApiError};
use crate::core::models::{ActionReceipt, Container};
use crate::core::poller::Poller;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
    /// Rebuild the image and restart the container
    Rebuild,
}

impl ContainerAction {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Restart => "restart",
            ContainerAction::Rebuild => "rebuild",
        }
    }

    /// "Starting", "Stopping", ...
    pub fn progressive(&self) -> &'static str {
        match self {
            ContainerAction::Start => "Starting",
            ContainerAction::Stop => "Stopping",
            ContainerAction::Restart => "Restarting",
            ContainerAction::Rebuild => "Rebuilding",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ContainerAction::Start => "started",
            ContainerAction::Stop => "stopped",
            ContainerAction::Restart => "restarted",
            ContainerAction::Rebuild => "rebuilt",
        }
    }

    /// Whether a bulk run of this action touches `container`
    ///
    /// Start skips running containers and stop skips stopped ones.
    pub fn applies_to(&self, container: &Container) -> bool {
        match self {
            ContainerAction::Start => !container.running,
            ContainerAction::Stop => container.running,
            ContainerAction::Restart | ContainerAction::Rebuild => true,
        }
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Run `action` on `name`, then refresh `containers`
///
/// An API failure is returned as-is and the refresh is skipped, since the
/// server state did not change.
pub async fn perform(
    api: &ApiClient,
    containers: &Poller<Vec<Container>>,
    action: ContainerAction,
    name: &str,
) -> Result<ActionReceipt, ApiError> {
    info!(container = %name, %action, "container action requested");

    let receipt = match api.container_action(action, name).await {
        Ok(receipt) => receipt,
        Err(e) => {
            warn!(container = %name, %action, error = %e, "container action failed");
            return Err(e);
        }
    };

    if !containers.refresh_now().await {
        warn!(container = %name, %action, "container list refresh after action failed");
    }

    Ok(receipt)
}

/// Result of one container in a bulk run
#[derive(Debug)]
pub struct BulkOutcome {
    pub container: String,
    pub result: Result<ActionReceipt, ApiError>,
}

/// Per-container results of a bulk run, in list order
#[derive(Debug)]
pub struct BulkReport {
    pub action: ContainerAction,
    pub outcomes: Vec<BulkOutcome>,
}

impl BulkReport {
    pub fn failures(&self) -> impl Iterator<Item = &BulkOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failures().count()
    }

    /// One-line result, e.g. "3 of 4 containers started, 1 failed"
    pub fn summary(&self) -> String {
        let total = self.outcomes.len();
        if total == 0 {
            return format!("No containers to {}", self.action);
        }

        let failed = total - self.succeeded();
        let mut text = format!(
            "{} of {} containers {}",
            self.succeeded(),
            total,
            self.action.past_tense()
        );
        if failed > 0 {
            text.push_str(&format!(", {} failed", failed));
        }
        text
    }
}

/// Names `action` applies to, in list order
pub fn bulk_targets(action: ContainerAction, containers: &[Container]) -> Vec<String> {
    containers
        .iter()
        .filter(|c| action.applies_to(c))
        .map(|c| c.name.clone())
        .collect()
}

/// Apply `action` to each of `targets`, one at a time
///
/// A failure is recorded and the run moves on to the next container.
pub async fn run_bulk(api: &ApiClient, action: ContainerAction, targets: Vec<String>) -> BulkReport {
    let mut outcomes = Vec::with_capacity(targets.len());

    for container in targets {
        let result = api.container_action(action, &container).await;
        if let Err(e) = &result {
            warn!(container = %container, %action, error = %e, "bulk action failed for container");
        }
        outcomes.push(BulkOutcome { container, result });
    }

    BulkReport { action, outcomes }
}

/// Run `action` on every container it applies to, then refresh `containers`
/// once
///
/// Targets come from the list the poller currently holds; if nothing has
/// loaded yet the list is fetched first.
pub async fn perform_all(
    api: &ApiClient,
    containers: &Poller<Vec<Container>>,
    action: ContainerAction,
) -> BulkReport {
    if containers.value().is_none() {
        containers.refresh_now().await;
    }
    let targets = containers.with(|resource| {
        resource
            .value()
            .map(|list| bulk_targets(action, list))
            .unwrap_or_default()
    });

    info!(%action, count = targets.len(), "bulk container action requested");
    if targets.is_empty() {
        return BulkReport { action, outcomes: Vec::new() };
    }

    let report = run_bulk(api, action, targets).await;

    if !containers.refresh_now().await {
        warn!(%action, "container list refresh after bulk action failed");
    }

    report
}
