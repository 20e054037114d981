//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::MonitorBlueprint;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Monitor, MonitorConfig};

/// Execute the `run` command
pub async fn run_monitor(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(args)?;

    info!(
        broker = %blueprint.broker.uri,
        topics = blueprint.broker.topics.len(),
        simulation = blueprint.simulation.enabled,
        series_capacity = blueprint.store.series_capacity,
        alarm_threshold = blueprint.classifier.alarm_threshold,
        "Configuration loaded"
    );

    let monitor = Monitor::new(MonitorConfig {
        blueprint,
        refresh_interval: Duration::from_millis(args.refresh_ms.max(1)),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting monitor...");
    let stats = monitor
        .run(shutdown_signal())
        .await
        .context("Monitor execution failed")?;

    info!(
        stored = stats.core.readings_stored,
        rejected = stats.core.rejected(),
        dropped = stats.ingestion.messages_dropped,
        status = stats.final_status.label(),
        "Monitor completed"
    );
    stats.print_summary();

    Ok(())
}

/// Load the configuration file (or defaults) and apply CLI overrides
fn load_blueprint(args: &RunArgs) -> Result<MonitorBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            info!("No configuration file given, using defaults");
            MonitorBlueprint::default()
        }
    };

    if let Some(ref uri) = args.broker {
        info!(uri = %uri, "Overriding broker URI from CLI");
        blueprint.broker.uri = uri.clone();
    }
    if args.simulate {
        info!("Simulation enabled from CLI");
        blueprint.simulation.enabled = true;
    }

    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after CLI overrides")?;

    Ok(blueprint)
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(config: Option<std::path::PathBuf>) -> RunArgs {
        RunArgs {
            config,
            broker: None,
            simulate: false,
            refresh_ms: 1000,
            metrics_port: 0,
            timeout: 0,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        let blueprint = load_blueprint(&args(None)).unwrap();
        assert_eq!(blueprint.broker.uri, "mqtt://localhost:1883");
        assert!(!blueprint.simulation.enabled);
    }

    #[test]
    fn test_cli_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[store]\nseries_capacity = 50").unwrap();

        let mut run_args = args(Some(file.path().to_path_buf()));
        run_args.broker = Some("mqtt://mine-broker:1884".into());
        run_args.simulate = true;

        let blueprint = load_blueprint(&run_args).unwrap();
        assert_eq!(blueprint.store.series_capacity, 50);
        assert_eq!(blueprint.broker.uri, "mqtt://mine-broker:1884");
        assert!(blueprint.simulation.enabled);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut run_args = args(None);
        run_args.broker = Some("http://nope".into());
        assert!(load_blueprint(&run_args).is_err());

        assert!(load_blueprint(&args(Some("/definitely/missing.toml".into()))).is_err());
    }
}
