//! Configuration validation
//!
//! Rules:
//! - broker uri uses mqtt:// or tcp:// with a host
//! - at least one non-empty topic filter
//! - username and password are given together
//! - every capacity, interval and page size is > 0
//! - alarm threshold is finite and > 0
//! - simulated sensor has an id when simulation is enabled

use contracts::{ContractError, MonitorBlueprint};

/// Validate a MonitorBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    validate_broker(blueprint)?;
    validate_store(blueprint)?;
    validate_classifier(blueprint)?;
    validate_view(blueprint)?;
    validate_simulation(blueprint)?;
    Ok(())
}

fn require_positive(field: &str, value: u64) -> Result<(), ContractError> {
    if value == 0 {
        return Err(ContractError::config_validation(field, "must be > 0"));
    }
    Ok(())
}

fn validate_broker(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let broker = &blueprint.broker;

    broker.endpoint()?;

    if broker.client_id.trim().is_empty() {
        return Err(ContractError::config_validation(
            "broker.client_id",
            "client id cannot be empty",
        ));
    }

    if broker.topics.is_empty() {
        return Err(ContractError::config_validation(
            "broker.topics",
            "at least one topic filter is required",
        ));
    }
    for (idx, topic) in broker.topics.iter().enumerate() {
        if topic.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("broker.topics[{idx}]"),
                "topic filter cannot be empty",
            ));
        }
    }

    if broker.username.is_some() != broker.password.is_some() {
        return Err(ContractError::config_validation(
            "broker.username / broker.password",
            "credentials must be given together",
        ));
    }

    require_positive(
        "broker.reconnect_interval_secs",
        broker.reconnect_interval_secs,
    )?;
    require_positive("broker.keep_alive_secs", broker.keep_alive_secs)?;
    require_positive("broker.channel_capacity", broker.channel_capacity as u64)?;
    Ok(())
}

fn validate_store(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    require_positive("store.series_capacity", blueprint.store.series_capacity as u64)?;
    require_positive("store.log_capacity", blueprint.store.log_capacity as u64)?;
    Ok(())
}

fn validate_classifier(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let threshold = blueprint.classifier.alarm_threshold;
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(ContractError::config_validation(
            "classifier.alarm_threshold",
            format!("alarm_threshold must be finite and > 0, got {threshold}"),
        ));
    }
    Ok(())
}

fn validate_view(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    require_positive("view.page_size", blueprint.view.page_size as u64)?;
    require_positive(
        "view.chart_reduction_factor",
        blueprint.view.chart_reduction_factor as u64,
    )?;
    Ok(())
}

fn validate_simulation(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let sim = &blueprint.simulation;
    if !sim.enabled {
        return Ok(());
    }

    if sim.sensor_id.trim().is_empty() {
        return Err(ContractError::config_validation(
            "simulation.sensor_id",
            "simulated sensor id cannot be empty",
        ));
    }
    require_positive("simulation.interval_ms", sim.interval_ms)?;
    if !(sim.vibration_max.is_finite() && sim.vibration_max > 0.0) {
        return Err(ContractError::config_validation(
            "simulation.vibration_max",
            "must be finite and > 0",
        ));
    }
    if !(sim.axis_span.is_finite() && sim.axis_span > 0.0) {
        return Err(ContractError::config_validation(
            "simulation.axis_span",
            "must be finite and > 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ContractError) -> String {
        match err {
            ContractError::ConfigValidation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&MonitorBlueprint::default()).is_ok());
    }

    #[test]
    fn test_bad_uri_scheme() {
        let mut bp = MonitorBlueprint::default();
        bp.broker.uri = "ws://broker:80".into();
        assert_eq!(field_of(validate(&bp).unwrap_err()), "broker.uri");
    }

    #[test]
    fn test_empty_topic_list() {
        let mut bp = MonitorBlueprint::default();
        bp.broker.topics.clear();
        assert_eq!(field_of(validate(&bp).unwrap_err()), "broker.topics");

        bp.broker.topics = vec!["ok/#".into(), " ".into()];
        assert_eq!(field_of(validate(&bp).unwrap_err()), "broker.topics[1]");
    }

    #[test]
    fn test_unpaired_credentials() {
        let mut bp = MonitorBlueprint::default();
        bp.broker.username = Some("ops".into());
        assert!(field_of(validate(&bp).unwrap_err()).contains("password"));
    }

    #[test]
    fn test_threshold_must_be_positive() {
        let mut bp = MonitorBlueprint::default();
        bp.classifier.alarm_threshold = f64::NAN;
        assert_eq!(
            field_of(validate(&bp).unwrap_err()),
            "classifier.alarm_threshold"
        );
        bp.classifier.alarm_threshold = -1.0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_zero_capacities_rejected() {
        let mut bp = MonitorBlueprint::default();
        bp.store.log_capacity = 0;
        assert_eq!(field_of(validate(&bp).unwrap_err()), "store.log_capacity");

        let mut bp = MonitorBlueprint::default();
        bp.view.page_size = 0;
        assert_eq!(field_of(validate(&bp).unwrap_err()), "view.page_size");
    }

    #[test]
    fn test_simulation_checked_only_when_enabled() {
        let mut bp = MonitorBlueprint::default();
        bp.simulation.sensor_id = String::new();
        assert!(validate(&bp).is_ok());

        bp.simulation.enabled = true;
        assert_eq!(field_of(validate(&bp).unwrap_err()), "simulation.sensor_id");
    }
}
