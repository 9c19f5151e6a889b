/// Main dashboard screen

use chrono::Utc;
use std::collections::HashMap;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Sparkline, Table, TableState, Wrap},
    Frame,
};

use crate::app::LogsView;
use crate::core::log_parser::{format_timestamp_compact, LogLevel};
use crate::core::models::{Container, ContainerStats, HealthStatus, SystemMetrics};
use crate::core::{ContainerCounts, FilterCriteria, MetricsHistory, Phase, RemoteResource, StatusFilter};
use crate::utils::{
    format_age, format_clock, format_gb_pair, format_mb, format_percent, short_id, truncate_string,
    ContainerState, UsageLevel,
};

/// Everything one frame needs, borrowed from the app
pub struct DashboardView<'a> {
    pub health: &'a RemoteResource<HealthStatus>,
    pub metrics: &'a RemoteResource<SystemMetrics>,
    pub history: &'a MetricsHistory,
    pub containers: &'a RemoteResource<Vec<Container>>,
    /// Stats of every running container, for the table's CPU and Mem columns
    pub running_stats: &'a RemoteResource<HashMap<String, ContainerStats>>,
    pub visible: &'a [Container],
    pub counts: ContainerCounts,
    pub criteria: &'a FilterCriteria,
    pub selected_index: usize,
    pub selected_stats: Option<(&'a str, &'a RemoteResource<ContainerStats>)>,
    pub search_mode: bool,
    pub search_buffer: &'a str,
    pub logs: Option<&'a LogsView>,
    pub show_help: bool,
    pub status_message: Option<&'a str>,
}

fn usage_color(percent: f64) -> Color {
    match UsageLevel::of(percent) {
        UsageLevel::Critical => Color::Red,
        UsageLevel::Warning => Color::Yellow,
        UsageLevel::Normal => Color::Green,
    }
}

fn state_color(state: ContainerState) -> Color {
    match state {
        ContainerState::Running => Color::Green,
        ContainerState::Created => Color::Blue,
        ContainerState::Stopped => Color::Gray,
        ContainerState::Paused => Color::Yellow,
        ContainerState::Restarting => Color::Cyan,
        ContainerState::Dead => Color::Red,
        ContainerState::Unknown => Color::White,
    }
}

fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Info => Color::Green,
        LogLevel::Debug => Color::DarkGray,
        LogLevel::Other => Color::White,
    }
}

/// CPU and memory cells for one table row
fn usage_cells(stats: Option<&ContainerStats>) -> [Cell<'static>; 2] {
    match stats {
        Some(s) => [
            Cell::from(Span::styled(format_percent(s.cpu_percent), Style::default().fg(usage_color(s.cpu_percent)))),
            Cell::from(Span::styled(
                format_mb(s.memory_usage_mb),
                Style::default().fg(usage_color(s.memory_percent)),
            )),
        ],
        None => [
            Cell::from(Span::styled("-", Style::default().fg(Color::DarkGray))),
            Cell::from(Span::styled("-", Style::default().fg(Color::DarkGray))),
        ],
    }
}

/// Short tag for a resource that is not simply fresh
fn phase_hint<T>(resource: &RemoteResource<T>) -> Option<Span<'static>> {
    match resource.phase() {
        Phase::Ready => None,
        Phase::Refreshing => Some(Span::styled(" ⟳", Style::default().fg(Color::DarkGray))),
        Phase::Loading => Some(Span::styled(" loading...", Style::default().fg(Color::DarkGray))),
        Phase::Stale => Some(Span::styled(" (stale)", Style::default().fg(Color::Yellow))),
        Phase::Uninitialized => Some(Span::styled(" unavailable", Style::default().fg(Color::Red))),
    }
}

pub struct Dashboard {
    title: String,
    api_url: String,
}

impl Dashboard {
    pub fn new(api_url: &str) -> Self {
        Self {
            title: "LocalPlace Dashboard".to_string(),
            api_url: api_url.to_string(),
        }
    }

    pub fn render(&self, frame: &mut Frame, view: &DashboardView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title + connectivity
                Constraint::Length(5), // Host metrics
                Constraint::Min(0),    // Containers
                Constraint::Length(6), // Selected container
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        self.render_title(frame, chunks[0], view);
        self.render_metrics(frame, chunks[1], view);
        self.render_containers(frame, chunks[2], view);
        self.render_selected(frame, chunks[3], view);
        self.render_footer(frame, chunks[4], view);

        if let Some(logs) = view.logs {
            self.render_logs(frame, logs);
        }

        if view.show_help {
            self.render_help(frame);
        }
    }

    fn render_title(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let mut spans = vec![
            Span::styled(
                &self.title,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(&self.api_url, Style::default().fg(Color::DarkGray)),
            Span::raw("  |  API: "),
        ];

        match view.health.value() {
            Some(health) => {
                let api_color = if health.is_healthy() { Color::Green } else { Color::Yellow };
                spans.push(Span::styled(
                    health.status.clone(),
                    Style::default().fg(api_color).add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::raw(format!(" v{}", health.version)));
                spans.push(Span::raw("  |  Docker: "));
                spans.push(if health.docker_connected {
                    Span::styled("connected", Style::default().fg(Color::Green))
                } else {
                    Span::styled("disconnected", Style::default().fg(Color::Red))
                });
            }
            None => {
                spans.push(Span::styled("?", Style::default().fg(Color::DarkGray)));
            }
        }

        if let Some(hint) = phase_hint(view.health) {
            spans.push(hint);
        }

        let title = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));

        frame.render_widget(title, area);
    }

    fn render_metrics(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        let metrics = view.metrics.value();
        let stale = matches!(view.metrics.phase(), Phase::Stale);

        let panels = [
            (
                "CPU",
                metrics.map(|m| (m.cpu_percent, String::new())),
                view.history.cpu_series(),
            ),
            (
                "Memory",
                metrics.map(|m| {
                    (m.memory.percent, format!(" {}", format_gb_pair(m.memory.used_gb, m.memory.total_gb)))
                }),
                view.history.memory_series(),
            ),
            (
                "Disk",
                metrics.map(|m| {
                    (m.disk.percent, format!(" {}", format_gb_pair(m.disk.used_gb, m.disk.total_gb)))
                }),
                view.history.disk_series(),
            ),
        ];

        for ((label, reading, series), column) in panels.iter().zip(columns.iter()) {
            let (title, color) = match reading {
                Some((percent, detail)) => (
                    format!(
                        " {} {}{}{} ",
                        label,
                        format_percent(*percent),
                        detail,
                        if stale { " (stale)" } else { "" }
                    ),
                    usage_color(*percent),
                ),
                None => (format!(" {} -- ", label), Color::DarkGray),
            };

            let sparkline = Sparkline::default()
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(Span::styled(title, Style::default().fg(color).add_modifier(Modifier::BOLD))),
                )
                .data(series)
                .max(100)
                .style(Style::default().fg(color));

            frame.render_widget(sparkline, *column);
        }
    }

    fn render_containers(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let mut title = vec![Span::styled(
            format!(
                " Containers {}/{} running ",
                view.counts.running, view.counts.total
            ),
            if view.counts.total > 0 && view.counts.running == view.counts.total {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            },
        )];

        if view.criteria.status_filter != StatusFilter::All {
            title.push(Span::styled(
                format!("[{}] ", view.criteria.status_filter),
                Style::default().fg(Color::Cyan),
            ));
        }
        if !view.criteria.search_term.is_empty() {
            title.push(Span::styled(
                format!("[/{}] ", view.criteria.search_term),
                Style::default().fg(Color::Cyan),
            ));
        }
        if let Some(hint) = phase_hint(view.containers) {
            title.push(hint);
        }

        let block = Block::default().borders(Borders::ALL).title(Line::from(title));

        if view.visible.is_empty() {
            let message = match (view.containers.value(), view.containers.last_error()) {
                (None, Some(error)) => format!("Could not load containers: {}", error),
                (None, None) => "Loading containers...".to_string(),
                (Some(_), _) if !view.criteria.is_empty() => "No containers match the current filter".to_string(),
                (Some(_), _) => "No containers".to_string(),
            };
            let empty = Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let header = Row::new(vec!["Name", "State", "CPU", "Mem", "Status", "Image", "Ports", "Created"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .bottom_margin(1);

        let now = Utc::now();
        let running_stats = view.running_stats.value();
        let rows: Vec<Row> = view
            .visible
            .iter()
            .map(|container| {
                let state = container.state_kind();
                let stats = running_stats
                    .filter(|_| container.running)
                    .and_then(|all| all.get(&container.name));
                let [cpu, mem] = usage_cells(stats);
                Row::new(vec![
                    Cell::from(container.name.clone()),
                    Cell::from(Span::styled(state.as_str(), Style::default().fg(state_color(state)))),
                    cpu,
                    mem,
                    Cell::from(truncate_string(&container.status, 24)),
                    Cell::from(truncate_string(&container.image, 32)),
                    Cell::from(truncate_string(&container.ports_label(), 28)),
                    Cell::from(format_age(&container.created, now)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(20),
                Constraint::Length(11),
                Constraint::Length(7),
                Constraint::Length(10),
                Constraint::Percentage(14),
                Constraint::Percentage(18),
                Constraint::Percentage(14),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

        let mut state = TableState::default();
        state.select(Some(view.selected_index.min(view.visible.len() - 1)));

        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_selected(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let block = Block::default().borders(Borders::ALL).title(" Details ");

        let Some(container) = view.visible.get(view.selected_index) else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(
                container.name.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  {}  ", short_id(&container.id))),
            Span::styled(container.image.clone(), Style::default().fg(Color::Gray)),
        ])];

        match view.selected_stats {
            Some((name, stats)) if name == container.name => match stats.value() {
                Some(s) => {
                    let mut usage = vec![
                        Span::styled("CPU: ", Style::default().fg(Color::Gray)),
                        Span::styled(format_percent(s.cpu_percent), Style::default().fg(usage_color(s.cpu_percent))),
                        Span::raw(" | "),
                        Span::styled("Mem: ", Style::default().fg(Color::Gray)),
                        Span::styled(
                            format!(
                                "{} / {} ({})",
                                format_mb(s.memory_usage_mb),
                                format_mb(s.memory_limit_mb),
                                format_percent(s.memory_percent)
                            ),
                            Style::default().fg(usage_color(s.memory_percent)),
                        ),
                        Span::raw(" | "),
                        Span::styled("Net: ", Style::default().fg(Color::Gray)),
                        Span::raw(format!(
                            "↓{} ↑{}",
                            format_mb(s.network_rx_mb),
                            format_mb(s.network_tx_mb)
                        )),
                    ];
                    if let Some(hint) = phase_hint(stats) {
                        usage.push(hint);
                    }
                    lines.push(Line::from(usage));

                    if let Some(at) = stats.updated_at() {
                        lines.push(Line::from(Span::styled(
                            format!("updated {}", format_clock(at)),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                }
                None => {
                    let text = match stats.last_error() {
                        Some(error) => format!("Stats unavailable: {}", error),
                        None => "Loading stats...".to_string(),
                    };
                    lines.push(Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))));
                }
            },
            _ => {
                lines.push(Line::from(Span::styled(
                    format!("{} (no live stats while not running)", container.status),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        let details = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(details, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let footer_text = if view.search_mode {
            format!("Search: {}_ | [Enter] Apply | [Esc] Cancel", view.search_buffer)
        } else if let Some(status) = view.status_message {
            status.to_string()
        } else if view.logs.is_some() {
            "[↑↓/PgUp/PgDn] Scroll | [End] Newest | [r]eload | [Esc] Close".to_string()
        } else {
            "[↑↓] Select | [/] Search | [f]ilter | [s]tart | [x] stop | [R]estart | [b] rebuild | [S/X/A] all | [l]ogs | [r]efresh | [?] Help | [q]uit".to_string()
        };

        let footer = Paragraph::new(footer_text)
            .alignment(Alignment::Center)
            .style(if view.status_message.is_some() || view.search_mode {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            })
            .block(Block::default().borders(Borders::ALL));

        frame.render_widget(footer, area);
    }

    fn render_logs(&self, frame: &mut Frame, logs: &LogsView) {
        let area = popup_area(frame.size(), 90, 80);

        let title = if logs.loading {
            format!(" Logs: {} (loading...) ", logs.container)
        } else {
            format!(" Logs: {} ({} lines) ", logs.container, logs.lines.len())
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Span::styled(title, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)));

        let text: Vec<Line> = if let Some(error) = &logs.error {
            vec![Line::from(Span::styled(
                format!("Failed to load logs: {}", error),
                Style::default().fg(Color::Red),
            ))]
        } else if logs.lines.is_empty() && !logs.loading {
            vec![Line::from(Span::styled("No log output", Style::default().fg(Color::DarkGray)))]
        } else {
            let height = area.height.saturating_sub(2) as usize;
            let end = logs.lines.len().saturating_sub(logs.scroll);
            let start = end.saturating_sub(height);

            logs.lines[start..end]
                .iter()
                .map(|line| {
                    let mut spans = Vec::with_capacity(3);
                    if let Some(ts) = &line.timestamp {
                        spans.push(Span::styled(
                            format!("{} ", format_timestamp_compact(ts)),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                    spans.push(Span::styled(
                        format!("{} ", line.level.label()),
                        Style::default().fg(level_color(line.level)).add_modifier(Modifier::BOLD),
                    ));
                    spans.push(Span::raw(line.message.clone()));
                    Line::from(spans)
                })
                .collect()
        };

        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(text).block(block), area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = popup_area(frame.size(), 60, 70);
        let section = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

        let help_text = vec![
            Line::from(Span::styled(
                "LocalPlace - Keyboard Shortcuts",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled("Navigation:", section)),
            Line::from("  [↑ ↓] / [k j]  Select container"),
            Line::from("  [/]            Search by name (live)"),
            Line::from("  [f]            Cycle filter: all → running → stopped"),
            Line::from(""),
            Line::from(Span::styled("Container Actions:", section)),
            Line::from("  [s]            Start"),
            Line::from("  [x]            Stop"),
            Line::from("  [R]            Restart"),
            Line::from("  [b]            Rebuild image and restart"),
            Line::from("  [l] / [Enter]  View recent logs"),
            Line::from(""),
            Line::from(Span::styled("All Containers:", section)),
            Line::from("  [S]            Start all stopped"),
            Line::from("  [X]            Stop all running"),
            Line::from("  [A]            Restart all"),
            Line::from(""),
            Line::from(Span::styled("General:", section)),
            Line::from("  [r]            Refresh everything now"),
            Line::from("  [?] / [F1]     Toggle this help"),
            Line::from("  [q] / [Esc]    Quit"),
        ];

        let help_widget = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(Span::styled(" Help ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(Clear, area);
        frame.render_widget(help_widget, area);
    }
}

/// Centered rectangle taking the given percentages of `area`
fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(percent_y) / 100) as u16;

    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
