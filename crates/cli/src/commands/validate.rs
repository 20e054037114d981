//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::MonitorBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    broker: String,
    topic_count: usize,
    series_capacity: usize,
    alarm_threshold: f64,
    simulation: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    broker: blueprint.broker.uri.clone(),
                    topic_count: blueprint.broker.topics.len(),
                    series_capacity: blueprint.store.series_capacity,
                    alarm_threshold: blueprint.classifier.alarm_threshold,
                    simulation: blueprint.simulation.enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Non-fatal configuration issues
fn collect_warnings(blueprint: &MonitorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.simulation.enabled {
        warnings.push("simulation.enabled is set - the broker will not be contacted".to_string());
    }

    if blueprint.broker.username.is_some() && blueprint.broker.uri.starts_with("mqtt://") {
        warnings.push("credentials are sent over an unencrypted connection".to_string());
    }

    if blueprint.store.log_capacity > blueprint.store.series_capacity {
        warnings.push(format!(
            "store.log_capacity ({}) exceeds store.series_capacity ({})",
            blueprint.store.log_capacity, blueprint.store.series_capacity
        ));
    }

    if blueprint.view.page_size > blueprint.store.series_capacity {
        warnings.push("view.page_size is larger than a full series".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Broker: {}", summary.broker);
            println!("  Topics: {}", summary.topic_count);
            println!("  Series capacity: {}", summary.series_capacity);
            println!("  Alarm threshold: {}", summary.alarm_threshold);
            println!("  Simulation: {}", summary.simulation);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
