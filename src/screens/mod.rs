pub mod dashboard;

// Single-screen layout: connectivity header, host metric sparklines,
// container table, selected container details and footer. Logs and help
// are overlays on top of it.

pub use dashboard::{Dashboard, DashboardView};
