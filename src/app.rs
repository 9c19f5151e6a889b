/// Main TUI application

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    Terminal,
};
use std::collections::HashMap;
use std::io;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::core::actions::{self, ContainerAction};
use crate::core::log_parser::{parse_log_line, ParsedLogLine};
use crate::core::models::{Container, ContainerLogs, ContainerStats, HealthStatus, SystemMetrics};
use crate::core::{filter_containers, ApiClient, ContainerCounts, FilterCriteria, MetricsHistory, Poller, RemoteResource};
use crate::screens::{Dashboard, DashboardView};
use crate::utils::Settings;

const LOG_PAGE: usize = 20;

/// Work that needs an HTTP round trip, run after the next frame is drawn so
/// the "in progress" status is visible
#[derive(Debug, Clone, PartialEq)]
enum PendingTask {
    Action(ContainerAction, String),
    /// The action on every container it applies to
    Bulk(ContainerAction),
    Logs(String),
    Refresh,
}

/// State of the logs overlay
#[derive(Debug, Clone)]
pub struct LogsView {
    pub container: String,
    pub lines: Vec<ParsedLogLine>,
    /// Lines scrolled up from the bottom; 0 follows the newest line
    pub scroll: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl LogsView {
    fn loading(container: String) -> Self {
        Self {
            container,
            lines: Vec::new(),
            scroll: 0,
            loading: true,
            error: None,
        }
    }

    fn fill(&mut self, logs: ContainerLogs) {
        self.lines = logs.lines.iter().map(|line| parse_log_line(line)).collect();
        self.scroll = 0;
        self.loading = false;
        self.error = None;
    }

    fn scroll_up(&mut self, by: usize) {
        self.scroll = (self.scroll + by).min(self.lines.len().saturating_sub(1));
    }

    fn scroll_down(&mut self, by: usize) {
        self.scroll = self.scroll.saturating_sub(by);
    }
}

/// Stats poller bound to the selected container
struct StatsWatch {
    container: String,
    poller: Poller<ContainerStats>,
}

/// What to do with the selected-container stats poller
#[derive(Debug, PartialEq)]
enum StatsChange {
    Keep,
    Stop,
    Watch(String),
}

/// Only a running selection is watched; any other change replaces or stops
/// the current poller
fn stats_change(current: Option<&str>, selected: Option<&Container>) -> StatsChange {
    let target = selected.filter(|c| c.running).map(|c| c.name.as_str());
    match target {
        _ if target == current => StatsChange::Keep,
        None => StatsChange::Stop,
        Some(name) => StatsChange::Watch(name.to_string()),
    }
}

pub struct App {
    api: ApiClient,
    settings: Settings,

    health: Poller<HealthStatus>,
    metrics: Poller<SystemMetrics>,
    containers: Poller<Vec<Container>>,
    running_stats: Poller<HashMap<String, ContainerStats>>,
    stats: Option<StatsWatch>,

    metrics_rx: watch::Receiver<RemoteResource<SystemMetrics>>,
    containers_rx: watch::Receiver<RemoteResource<Vec<Container>>>,
    last_sample_at: Option<DateTime<Local>>,
    containers_at: Option<DateTime<Local>>,
    history: MetricsHistory,

    all_containers: Vec<Container>,
    criteria: FilterCriteria,
    visible: Vec<Container>,
    selected_index: usize,

    search_mode: bool,
    search_buffer: String,
    logs_view: Option<LogsView>,
    show_help: bool,
    status_message: Option<String>,
    pending: Option<PendingTask>,
    should_quit: bool,
    dashboard: Dashboard,
}

impl App {
    /// Build the client and start the background pollers
    ///
    /// Must be called inside the tokio runtime.
    pub fn new(settings: Settings) -> Result<Self> {
        let api = ApiClient::with_timeout(&settings.api_url, settings.request_timeout)
            .context("Failed to create API client")?
            .with_action_timeout(settings.action_timeout);

        let health = {
            let api = api.clone();
            Poller::start("health", settings.health_interval, move || {
                let api = api.clone();
                async move { api.health().await }
            })
        };

        let metrics = {
            let api = api.clone();
            Poller::start("system-metrics", settings.metrics_interval, move || {
                let api = api.clone();
                async move { api.system_metrics().await }
            })
        };

        let containers = {
            let api = api.clone();
            Poller::start("containers", settings.containers_interval, move || {
                let api = api.clone();
                async move { api.list_containers(true).await }
            })
        };

        let running_stats = {
            let api = api.clone();
            Poller::start("running-stats", settings.stats_interval, move || {
                let api = api.clone();
                async move { api.running_container_stats().await }
            })
        };

        let metrics_rx = metrics.subscribe();
        let containers_rx = containers.subscribe();
        let dashboard = Dashboard::new(api.base_url());

        Ok(Self {
            api,
            settings,
            health,
            metrics,
            containers,
            running_stats,
            stats: None,
            metrics_rx,
            containers_rx,
            last_sample_at: None,
            containers_at: None,
            history: MetricsHistory::default(),
            all_containers: Vec::new(),
            criteria: FilterCriteria::default(),
            visible: Vec::new(),
            selected_index: 0,
            search_mode: false,
            search_buffer: String::new(),
            logs_view: None,
            show_help: false,
            status_message: None,
            pending: None,
            should_quit: false,
            dashboard,
        })
    }

    fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        self.shutdown();
        result
    }

    fn shutdown(&mut self) {
        self.health.stop();
        self.metrics.stop();
        self.containers.stop();
        self.running_stats.stop();
        if let Some(mut watch) = self.stats.take() {
            watch.poller.stop();
        }
        info!("dashboard closed");
    }

    async fn run_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<()> {
        loop {
            self.sync_data();

            terminal.draw(|f| self.render(f))?;

            if let Some(task) = self.pending.take() {
                self.run_task(task).await;
                continue;
            }

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key_event) = event::read()? {
                    if key_event.kind == KeyEventKind::Press {
                        self.handle_key(key_event.code);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Pull whatever the pollers published since the last frame
    fn sync_data(&mut self) {
        if self.metrics_rx.has_changed().unwrap_or(false) {
            let resource = self.metrics_rx.borrow_and_update();
            if let (Some(metrics), Some(at)) = (resource.value(), resource.updated_at()) {
                if self.last_sample_at != Some(at) {
                    self.history.record(metrics, at);
                    self.last_sample_at = Some(at);
                }
            }
        }

        if self.containers_rx.has_changed().unwrap_or(false) {
            let update = {
                let resource = self.containers_rx.borrow_and_update();
                match (resource.value(), resource.updated_at()) {
                    (Some(list), Some(at)) if self.containers_at != Some(at) => {
                        Some((list.clone(), at))
                    }
                    _ => None,
                }
            };

            if let Some((list, at)) = update {
                debug!(count = list.len(), "container list updated");
                self.all_containers = list;
                self.containers_at = Some(at);
                self.apply_filter();
            }
        }

        self.sync_stats_watch();
    }

    fn apply_filter(&mut self) {
        let selected_name = self.selected_container().map(|c| c.name.clone());
        self.visible = filter_containers(&self.all_containers, &self.criteria);
        self.selected_index = reselect(&self.visible, selected_name.as_deref(), self.selected_index);
    }

    fn selected_container(&self) -> Option<&Container> {
        self.visible.get(self.selected_index)
    }

    /// Keep one stats poller for the selected container while it runs
    fn sync_stats_watch(&mut self) {
        let change = stats_change(
            self.stats.as_ref().map(|w| w.container.as_str()),
            self.selected_container(),
        );

        match change {
            StatsChange::Keep => {}
            StatsChange::Stop => {
                if let Some(mut watch) = self.stats.take() {
                    watch.poller.stop();
                }
            }
            StatsChange::Watch(name) => {
                debug!(container = %name, "watching container stats");
                // Dropping the previous watch stops its poller
                self.stats = Some(self.watch_stats(name));
            }
        }
    }

    fn watch_stats(&self, container: String) -> StatsWatch {
        let api = self.api.clone();
        let target = container.clone();
        let poller = Poller::start(
            format!("stats:{}", container),
            self.settings.stats_interval,
            move || {
                let api = api.clone();
                let target = target.clone();
                async move { api.container_stats(&target).await }
            },
        );

        StatsWatch { container, poller }
    }

    async fn run_task(&mut self, task: PendingTask) {
        match task {
            PendingTask::Action(action, name) => {
                match actions::perform(&self.api, &self.containers, action, &name).await {
                    Ok(receipt) => self.set_status(format!("✓ {}", receipt.message)),
                    Err(e) => self.set_status(format!("✗ Failed to {} {}: {}", action, name, e)),
                }
            }
            PendingTask::Bulk(action) => {
                let report = actions::perform_all(&self.api, &self.containers, action).await;
                let failed: Vec<&str> = report.failures().map(|o| o.container.as_str()).collect();
                if failed.is_empty() {
                    self.set_status(format!("✓ {}", report.summary()));
                } else {
                    self.set_status(format!("✗ {} ({})", report.summary(), failed.join(", ")));
                }
            }
            PendingTask::Logs(name) => {
                let result = self.api.container_logs(&name, self.settings.log_tail).await;
                let Some(view) = self.logs_view.as_mut().filter(|v| v.container == name) else {
                    return;
                };
                match result {
                    Ok(logs) => view.fill(logs),
                    Err(e) => {
                        view.loading = false;
                        view.error = Some(e.to_string());
                    }
                }
            }
            PendingTask::Refresh => {
                let stats = async {
                    match &self.stats {
                        Some(watch) => watch.poller.refresh_now().await,
                        None => true,
                    }
                };
                let (health, metrics, containers, running_stats, stats) = tokio::join!(
                    self.health.refresh_now(),
                    self.metrics.refresh_now(),
                    self.containers.refresh_now(),
                    self.running_stats.refresh_now(),
                    stats,
                );

                if health && metrics && containers && running_stats && stats {
                    self.set_status("✓ Refreshed".to_string());
                } else {
                    self.set_status("Refresh incomplete, showing last known data".to_string());
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.search_mode {
            return self.handle_search_key(key);
        }

        if self.logs_view.is_some() {
            return self.handle_logs_key(key);
        }

        self.clear_status();

        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_index + 1 < self.visible.len() {
                    self.selected_index += 1;
                }
            }
            KeyCode::Home => {
                self.selected_index = 0;
            }
            KeyCode::End => {
                self.selected_index = self.visible.len().saturating_sub(1);
            }
            KeyCode::Char('/') => {
                self.search_mode = true;
                self.search_buffer = self.criteria.search_term.clone();
            }
            KeyCode::Char('f') => {
                self.criteria.status_filter = self.criteria.status_filter.cycle();
                self.apply_filter();
                self.set_status(format!("Showing {} containers", self.criteria.status_filter));
            }
            KeyCode::Char('r') => {
                self.set_status("Refreshing...".to_string());
                self.pending = Some(PendingTask::Refresh);
            }
            KeyCode::Char('s') => self.queue_action(ContainerAction::Start),
            KeyCode::Char('x') => self.queue_action(ContainerAction::Stop),
            KeyCode::Char('R') => self.queue_action(ContainerAction::Restart),
            KeyCode::Char('b') => self.queue_action(ContainerAction::Rebuild),
            KeyCode::Char('S') => self.queue_bulk(ContainerAction::Start),
            KeyCode::Char('X') => self.queue_bulk(ContainerAction::Stop),
            KeyCode::Char('A') => self.queue_bulk(ContainerAction::Restart),
            KeyCode::Char('l') | KeyCode::Enter => {
                if let Some(name) = self.selected_container().map(|c| c.name.clone()) {
                    self.logs_view = Some(LogsView::loading(name.clone()));
                    self.pending = Some(PendingTask::Logs(name));
                }
            }
            _ => {}
        }
    }

    fn queue_action(&mut self, action: ContainerAction) {
        let Some(name) = self.selected_container().map(|c| c.name.clone()) else {
            return;
        };

        self.set_status(format!("{} {}...", action.progressive(), name));
        self.pending = Some(PendingTask::Action(action, name));
    }

    fn queue_bulk(&mut self, action: ContainerAction) {
        self.set_status(format!("{} all containers...", action.progressive()));
        self.pending = Some(PendingTask::Bulk(action));
    }

    fn handle_search_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(c) => {
                self.search_buffer.push(c);
                // Apply filter in real-time
                self.criteria.search_term = self.search_buffer.clone();
                self.apply_filter();
            }
            KeyCode::Backspace => {
                self.search_buffer.pop();
                self.criteria.search_term = self.search_buffer.clone();
                self.apply_filter();
            }
            KeyCode::Enter => {
                self.search_mode = false;
                if self.search_buffer.is_empty() {
                    self.set_status("Search cleared".to_string());
                } else {
                    self.set_status(format!(
                        "Found {} matches for '{}'",
                        self.visible.len(),
                        self.search_buffer
                    ));
                }
            }
            KeyCode::Esc => {
                // Cancel search
                self.search_mode = false;
                self.search_buffer.clear();
                self.criteria.search_term.clear();
                self.apply_filter();
                self.set_status("Search cancelled".to_string());
            }
            _ => {}
        }
    }

    fn handle_logs_key(&mut self, key: KeyCode) {
        let Some(view) = self.logs_view.as_mut() else {
            return;
        };

        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('l') => {
                self.logs_view = None;
            }
            KeyCode::Up | KeyCode::Char('k') => view.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => view.scroll_down(1),
            KeyCode::PageUp => view.scroll_up(LOG_PAGE),
            KeyCode::PageDown => view.scroll_down(LOG_PAGE),
            KeyCode::End => view.scroll = 0,
            KeyCode::Char('r') => {
                let name = view.container.clone();
                view.loading = true;
                self.pending = Some(PendingTask::Logs(name));
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        let health = self.health.snapshot();
        let metrics = self.metrics.snapshot();
        let containers = self.containers.snapshot();
        let running_stats = self.running_stats.snapshot();
        let stats = self
            .stats
            .as_ref()
            .map(|watch| (watch.container.as_str(), watch.poller.snapshot()));

        let view = DashboardView {
            health: &health,
            metrics: &metrics,
            history: &self.history,
            containers: &containers,
            running_stats: &running_stats,
            visible: &self.visible,
            counts: ContainerCounts::of(&self.all_containers),
            criteria: &self.criteria,
            selected_index: self.selected_index,
            selected_stats: stats.as_ref().map(|(name, resource)| (*name, resource)),
            search_mode: self.search_mode,
            search_buffer: &self.search_buffer,
            logs: self.logs_view.as_ref(),
            show_help: self.show_help,
            status_message: self.status_message.as_deref(),
        };

        self.dashboard.render(frame, &view);
    }
}

/// Index to select after the visible list changed
///
/// Follows the previously selected container by name; otherwise keeps the
/// position, clamped to the new length.
fn reselect(visible: &[Container], selected_name: Option<&str>, previous: usize) -> usize {
    if let Some(index) = selected_name.and_then(|name| visible.iter().position(|c| c.name == name)) {
        return index;
    }
    previous.min(visible.len().saturating_sub(1))
}
