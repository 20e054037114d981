//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::MonitorBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    broker: BrokerInfo,
    store: StoreInfo,
    alarm_threshold: f64,
    page_size: usize,
    chart_reduction_factor: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    simulation: Option<SimulationInfo>,
}

#[derive(Serialize)]
struct BrokerInfo {
    uri: String,
    host: String,
    port: u16,
    client_id: String,
    topics: Vec<String>,
    authenticated: bool,
    reconnect_interval_secs: u64,
    channel_capacity: usize,
    drop_policy: String,
}

#[derive(Serialize)]
struct StoreInfo {
    series_capacity: usize,
    log_capacity: usize,
}

#[derive(Serialize)]
struct SimulationInfo {
    sensor_id: String,
    topic: String,
    interval_ms: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let config_info = build_config_info(&blueprint)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&config_info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config_info);
    }

    Ok(())
}

fn build_config_info(blueprint: &MonitorBlueprint) -> Result<ConfigInfo> {
    let broker = &blueprint.broker;
    let endpoint = broker.endpoint().context("Invalid broker URI")?;

    Ok(ConfigInfo {
        version: format!("{:?}", blueprint.version),
        broker: BrokerInfo {
            uri: broker.uri.clone(),
            host: endpoint.host,
            port: endpoint.port,
            client_id: broker.client_id.clone(),
            topics: broker.topics.clone(),
            authenticated: broker.username.is_some(),
            reconnect_interval_secs: broker.reconnect_interval_secs,
            channel_capacity: broker.channel_capacity,
            drop_policy: format!("{:?}", broker.drop_policy),
        },
        store: StoreInfo {
            series_capacity: blueprint.store.series_capacity,
            log_capacity: blueprint.store.log_capacity,
        },
        alarm_threshold: blueprint.classifier.alarm_threshold,
        page_size: blueprint.view.page_size,
        chart_reduction_factor: blueprint.view.chart_reduction_factor,
        simulation: blueprint.simulation.enabled.then(|| SimulationInfo {
            sensor_id: blueprint.simulation.sensor_id.clone(),
            topic: blueprint.simulation.topic.clone(),
            interval_ms: blueprint.simulation.interval_ms,
        }),
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Mine Monitor Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nBroker:");
    println!("  URI: {} ({}:{})", info.broker.uri, info.broker.host, info.broker.port);
    println!("  Client ID: {}", info.broker.client_id);
    println!("  Topics: {}", info.broker.topics.join(", "));
    println!("  Authenticated: {}", info.broker.authenticated);
    println!("  Reconnect interval: {}s", info.broker.reconnect_interval_secs);
    println!(
        "  Queue: {} ({})",
        info.broker.channel_capacity, info.broker.drop_policy
    );

    println!("\nStore:");
    println!("  Series capacity: {}", info.store.series_capacity);
    println!("  Log capacity: {}", info.store.log_capacity);

    println!("\nClassifier:");
    println!("  Alarm threshold: |axis| > {}", info.alarm_threshold);

    println!("\nView:");
    println!("  Page size: {}", info.page_size);
    println!("  Chart reduction factor: {}", info.chart_reduction_factor);

    if let Some(ref sim) = info.simulation {
        println!("\nSimulation:");
        println!("  Sensor: {} on {}", sim.sensor_id, sim.topic);
        println!("  Interval: {}ms", sim.interval_ms);
    }

    println!();
}
