pub mod actions;
pub mod api;
pub mod filter;
pub mod history;
pub mod log_parser;
pub mod models;
pub mod poller;

pub use actions::ContainerAction;
pub use api::{ApiClient, ApiError};
pub use filter::{filter_containers, ContainerCounts, FilterCriteria, StatusFilter};
pub use history::MetricsHistory;
pub use poller::{Phase, Poller, RemoteResource};
