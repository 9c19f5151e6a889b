/// Local filtering of the polled container list

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::models::Container;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Running,
    Stopped,
}

impl StatusFilter {
    pub fn matches(&self, container: &Container) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Running => container.running,
            StatusFilter::Stopped => !container.running,
        }
    }

    /// All -> Running -> Stopped -> All
    pub fn cycle(&self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Running,
            StatusFilter::Running => StatusFilter::Stopped,
            StatusFilter::Stopped => StatusFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Running => "running",
            StatusFilter::Stopped => "stopped",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "running" | "up" => Ok(StatusFilter::Running),
            "stopped" | "exited" | "down" => Ok(StatusFilter::Stopped),
            other => Err(format!(
                "unknown status filter '{}' (expected all, running or stopped)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_term: String,
    pub status_filter: StatusFilter,
}

impl FilterCriteria {
    pub fn new(search_term: impl Into<String>, status_filter: StatusFilter) -> Self {
        Self {
            search_term: search_term.into(),
            status_filter,
        }
    }

    /// True when the criteria keep every container
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.status_filter == StatusFilter::All
    }
}

/// Containers matching `criteria`, in input order
///
/// The search term is a case-insensitive substring match on the name.
pub fn filter_containers(containers: &[Container], criteria: &FilterCriteria) -> Vec<Container> {
    let query = criteria.search_term.to_lowercase();

    containers
        .iter()
        .filter(|c| query.is_empty() || c.name.to_lowercase().contains(&query))
        .filter(|c| criteria.status_filter.matches(c))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerCounts {
    pub total: usize,
    pub running: usize,
    pub stopped: usize,
}

impl ContainerCounts {
    pub fn of(containers: &[Container]) -> Self {
        let running = containers.iter().filter(|c| c.running).count();
        Self {
            total: containers.len(),
            running,
            stopped: containers.len() - running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::StateField;

    fn container(name: &str, running: bool) -> Container {
        let state = if running { "running" } else { "exited" };
        Container {
            id: format!("{}-id", name),
            name: name.to_string(),
            status: state.to_string(),
            state: StateField::Text(state.to_string()),
            image: "busybox:latest".to_string(),
            ports: Vec::new(),
            created: "2025-10-29T10:00:00Z".to_string(),
            running,
        }
    }

    fn sample() -> Vec<Container> {
        vec![
            container("local-postgres", true),
            container("local-redis", false),
            container("local-mongodb", true),
            container("local-ollama", false),
            container("mylocalplace-api", true),
        ]
    }

    fn names(containers: &[Container]) -> Vec<&str> {
        containers.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let list = sample();
        assert_eq!(filter_containers(&list, &FilterCriteria::default()), list);
        assert!(filter_containers(&[], &FilterCriteria::default()).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let list = vec![container("Local-Postgres", true)];
        let result = filter_containers(&list, &FilterCriteria::new("post", StatusFilter::All));
        assert_eq!(names(&result), ["Local-Postgres"]);

        let result = filter_containers(&sample(), &FilterCriteria::new("LOCAL-", StatusFilter::All));
        assert_eq!(result.len(), 4);

        let result = filter_containers(&sample(), &FilterCriteria::new("pstgrs", StatusFilter::All));
        assert!(result.is_empty());
    }

    #[test]
    fn test_status_filter() {
        let list = sample();

        let running = filter_containers(&list, &FilterCriteria::new("", StatusFilter::Running));
        assert!(running.iter().all(|c| c.running));
        assert_eq!(running.len(), 3);

        let stopped = filter_containers(&list, &FilterCriteria::new("", StatusFilter::Stopped));
        assert!(stopped.iter().all(|c| !c.running));
        assert_eq!(names(&stopped), ["local-redis", "local-ollama"]);
    }

    #[test]
    fn test_predicates_compose_and_preserve_order() {
        let list = sample();
        let result = filter_containers(&list, &FilterCriteria::new("local-", StatusFilter::Running));
        assert_eq!(names(&result), ["local-postgres", "local-mongodb"]);

        // Every result comes from the input, in input order
        let positions: Vec<usize> = result
            .iter()
            .map(|c| list.iter().position(|l| l == c).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_status_filter_parse_and_cycle() {
        assert_eq!("Running".parse::<StatusFilter>(), Ok(StatusFilter::Running));
        assert_eq!("exited".parse::<StatusFilter>(), Ok(StatusFilter::Stopped));
        assert!("paused".parse::<StatusFilter>().is_err());

        let mut filter = StatusFilter::All;
        for expected in [StatusFilter::Running, StatusFilter::Stopped, StatusFilter::All] {
            filter = filter.cycle();
            assert_eq!(filter, expected);
        }
    }

    #[test]
    fn test_counts() {
        let counts = ContainerCounts::of(&sample());
        assert_eq!(counts, ContainerCounts { total: 5, running: 3, stopped: 2 });
    }
}
