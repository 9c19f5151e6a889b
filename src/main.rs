use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::*;
use std::time::Duration;

use localplace_cli::app::App;
use localplace_cli::cli::{Cli, Commands, ConfigCommands};
use localplace_cli::core::log_parser::{format_timestamp_compact, parse_log_line, LogLevel};
use localplace_cli::core::models::UsageInfo;
use localplace_cli::core::actions;
use localplace_cli::core::{filter_containers, ApiClient, ContainerAction, ContainerCounts, FilterCriteria};
use localplace_cli::utils::{
    format_age, format_gb_pair, format_mb, format_percent, logging, short_id, truncate_string,
    AppConfig, Settings, UsageLevel,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.command.is_some() {
        logging::init_cli(cli.verbose);
    }

    let settings = Settings::load(cli.api_url.clone())?;

    match cli.command {
        None => {
            // No command - run interactive TUI
            let log_path = logging::init_tui()?;
            tracing::info!(api = %settings.api_url, log = %log_path.display(), "starting dashboard");

            let mut app = App::new(settings)?;
            app.run().await?;
        }
        Some(Commands::Status { search, status }) => {
            let criteria = FilterCriteria::new(search.unwrap_or_default(), status);
            handle_status(&settings, &criteria).await?;
        }
        Some(Commands::Start { name, all }) => {
            handle_target(&settings, ContainerAction::Start, name, all).await?;
        }
        Some(Commands::Stop { name, all }) => {
            handle_target(&settings, ContainerAction::Stop, name, all).await?;
        }
        Some(Commands::Restart { name, all }) => {
            handle_target(&settings, ContainerAction::Restart, name, all).await?;
        }
        Some(Commands::Rebuild { name }) => {
            handle_action(&settings, ContainerAction::Rebuild, &name).await?;
        }
        Some(Commands::Logs { name, tail }) => {
            handle_logs(&settings, &name, tail.unwrap_or(settings.log_tail)).await?;
        }
        Some(Commands::Stats { name }) => {
            handle_stats(&settings, &name).await?;
        }
        Some(Commands::Health) => {
            handle_health(&settings).await?;
        }
        Some(Commands::Metrics) => {
            handle_metrics(&settings).await?;
        }
        Some(Commands::Config { command }) => {
            handle_config(&settings, command)?;
        }
    }

    Ok(())
}

fn client(settings: &Settings) -> Result<ApiClient> {
    let api = ApiClient::with_timeout(&settings.api_url, settings.request_timeout)
        .context("Failed to create API client")?;
    Ok(api.with_action_timeout(settings.action_timeout))
}

fn colored_percent(value: f64) -> ColoredString {
    let text = format_percent(value);
    match UsageLevel::of(value) {
        UsageLevel::Critical => text.red(),
        UsageLevel::Warning => text.yellow(),
        UsageLevel::Normal => text.green(),
    }
}

async fn handle_status(settings: &Settings, criteria: &FilterCriteria) -> Result<()> {
    let api = client(settings)?;
    let containers = api
        .list_containers(true)
        .await
        .with_context(|| format!("Failed to list containers from {}", api.base_url()))?;

    let visible = filter_containers(&containers, criteria);
    let counts = ContainerCounts::of(&containers);

    println!("{}\n", "LocalPlace Containers".bold());
    println!(
        "{:<28} {:<12} {:<14} {:<32} {}",
        "Name", "State", "ID", "Image", "Created"
    );
    println!("{}", "-".repeat(100));

    let now = Utc::now();
    for container in &visible {
        let state = container.state_kind();
        let state_label = format!("{:<12}", state.as_str());
        let state_label = if state.is_running() {
            state_label.green()
        } else {
            state_label.bright_black()
        };

        println!(
            "{:<28} {} {:<14} {:<32} {}",
            truncate_string(&container.name, 28),
            state_label,
            short_id(&container.id),
            truncate_string(&container.image, 32),
            format_age(&container.created, now)
        );
    }

    println!(
        "\n{} shown, {} total ({} running, {} stopped)",
        visible.len(),
        counts.total,
        counts.running.to_string().green(),
        counts.stopped
    );

    Ok(())
}

/// One named container, or every container the action applies to
async fn handle_target(
    settings: &Settings,
    action: ContainerAction,
    name: Option<String>,
    all: bool,
) -> Result<()> {
    match name {
        Some(name) if !all => handle_action(settings, action, &name).await,
        _ => handle_bulk(settings, action).await,
    }
}

async fn handle_bulk(settings: &Settings, action: ContainerAction) -> Result<()> {
    let api = client(settings)?;
    let containers = api
        .list_containers(true)
        .await
        .with_context(|| format!("Failed to list containers from {}", api.base_url()))?;

    let targets = actions::bulk_targets(action, &containers);
    if targets.is_empty() {
        println!("No containers to {}", action);
        return Ok(());
    }

    println!("{} {} containers...", action.progressive(), targets.len());
    let report = actions::run_bulk(&api, action, targets).await;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(receipt) => println!("  {} {}", "✓".green(), receipt.message),
            Err(e) => println!("  {} {}: {}", "✗".red(), outcome.container, e),
        }
    }
    println!("\n{}", report.summary());

    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{} failed for {} of {} containers", action, failed, report.outcomes.len());
    }

    Ok(())
}

async fn handle_action(settings: &Settings, action: ContainerAction, name: &str) -> Result<()> {
    let api = client(settings)?;
    println!("{} {}...", action.progressive(), name);

    match api.container_action(action, name).await {
        Ok(receipt) => {
            println!("{} {}", "✓".green(), receipt.message);
            Ok(())
        }
        Err(e) => {
            println!("{} Failed to {} {}: {}", "✗".red(), action, name, e);
            Err(e).with_context(|| format!("{} {} failed", action, name))
        }
    }
}

async fn handle_logs(settings: &Settings, name: &str, tail: usize) -> Result<()> {
    let api = client(settings)?;
    let logs = api
        .container_logs(name, tail)
        .await
        .with_context(|| format!("Failed to fetch logs for {}", name))?;

    if logs.lines.is_empty() {
        println!("No log output for {}", logs.container);
        return Ok(());
    }

    for line in &logs.lines {
        let parsed = parse_log_line(line);
        let time = parsed
            .timestamp
            .as_deref()
            .map(format_timestamp_compact)
            .unwrap_or_default();

        let message = match parsed.level {
            LogLevel::Error => parsed.message.red(),
            LogLevel::Warn => parsed.message.yellow(),
            LogLevel::Debug => parsed.message.bright_black(),
            LogLevel::Info | LogLevel::Other => parsed.message.normal(),
        };

        if time.is_empty() {
            println!("{}", message);
        } else {
            println!("{} {}", time.dimmed(), message);
        }
    }

    Ok(())
}

async fn handle_stats(settings: &Settings, name: &str) -> Result<()> {
    let api = client(settings)?;
    let stats = api
        .container_stats(name)
        .await
        .with_context(|| format!("Failed to fetch stats for {}", name))?;

    println!("{}\n", format!("Container Stats: {}", name).bold());
    println!("  CPU:      {}", colored_percent(stats.cpu_percent));
    println!(
        "  Memory:   {} / {} ({})",
        format_mb(stats.memory_usage_mb),
        format_mb(stats.memory_limit_mb),
        colored_percent(stats.memory_percent)
    );
    println!("  Net RX:   {}", format_mb(stats.network_rx_mb));
    println!("  Net TX:   {}", format_mb(stats.network_tx_mb));

    Ok(())
}

async fn handle_health(settings: &Settings) -> Result<()> {
    let api = client(settings)?;

    match api.health().await {
        Ok(health) => {
            let status = if health.is_healthy() {
                health.status.green()
            } else {
                health.status.yellow()
            };
            let docker = if health.docker_connected {
                "connected".green()
            } else {
                "disconnected".red()
            };

            println!("API:     {} ({})", status, api.base_url());
            println!("Docker:  {}", docker);
            println!("Version: {}", health.version);
            println!("Time:    {}", health.timestamp);
            Ok(())
        }
        Err(e) => {
            println!("API:     {} ({})", "unreachable".red(), api.base_url());
            Err(e).context("Health check failed")
        }
    }
}

fn print_usage(label: &str, usage: &UsageInfo) {
    println!(
        "  {:<8}{} ({})",
        label,
        colored_percent(usage.percent),
        format_gb_pair(usage.used_gb, usage.total_gb)
    );
}

async fn handle_metrics(settings: &Settings) -> Result<()> {
    let api = client(settings)?;
    let metrics = api
        .system_metrics()
        .await
        .context("Failed to fetch system metrics")?;

    println!("{}\n", "Host Resources".bold());
    println!("  {:<8}{}", "CPU:", colored_percent(metrics.cpu_percent));
    print_usage("Memory:", &metrics.memory);
    print_usage("Disk:", &metrics.disk);

    Ok(())
}

fn describe_interval(interval: Option<Duration>) -> String {
    match interval {
        Some(every) => humantime::format_duration(every).to_string(),
        None => "once".to_string(),
    }
}

fn handle_config(settings: &Settings, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::View => {
            println!("{}\n", "Resolved Settings".bold());
            println!("  api_url:             {}", settings.api_url);
            println!("  health_interval:     {}", describe_interval(settings.health_interval));
            println!("  metrics_interval:    {}", describe_interval(settings.metrics_interval));
            println!("  containers_interval: {}", describe_interval(settings.containers_interval));
            println!("  stats_interval:      {}", describe_interval(settings.stats_interval));
            println!(
                "  request_timeout:     {}",
                humantime::format_duration(settings.request_timeout)
            );
            println!(
                "  action_timeout:      {}",
                humantime::format_duration(settings.action_timeout)
            );
            println!("  log_tail:            {}", settings.log_tail);
            println!("\nConfig file: {}", AppConfig::config_path()?.display());
        }
        ConfigCommands::SetUrl { url } => {
            // Validate before persisting
            ApiClient::new(url.as_str()).context("Refusing to save an invalid URL")?;

            let mut config = AppConfig::load()?;
            config.set_api_url(&url)?;
            println!("{} API URL set to {}", "✓".green(), url.trim().trim_end_matches('/'));
        }
        ConfigCommands::Path => {
            println!("{}", AppConfig::config_path()?.display());
        }
    }

    Ok(())
}
