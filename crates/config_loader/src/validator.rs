//! Configuration validation
//!
//! Field-level rules live on the blueprint types as `validator` derives.
//! Rules spanning several sections are checked here:
//! - sink names unique
//! - replay input has a path
//! - mock contacts fit the touch slot table
//! - network sinks carry a parseable `addr`

use std::collections::HashSet;
use std::net::SocketAddr;

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, GestureBlueprint, InputSource, SinkType};

/// Validate a GestureBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &GestureBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_sink_names(blueprint)?;
    validate_input(blueprint)?;
    validate_network_sinks(blueprint)?;
    Ok(())
}

/// Run the derived field rules
fn validate_fields(blueprint: &GestureBlueprint) -> Result<(), ContractError> {
    let errors = match blueprint.validate() {
        Ok(()) => return Ok(()),
        Err(errors) => errors,
    };

    let mut failures = Vec::new();
    flatten_errors(&errors, "", &mut failures);
    failures.sort();

    let (field, message) = failures
        .into_iter()
        .next()
        .unwrap_or_else(|| ("<root>".to_string(), errors.to_string()));
    Err(ContractError::config_validation(field, message))
}

/// Collect `(dotted.path, message)` pairs from nested validation errors
fn flatten_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let message = match (&failure.message, failure.params.get("value")) {
                        (Some(message), _) => message.to_string(),
                        (None, Some(value)) => {
                            format!("failed '{}' check, got {}", failure.code, value)
                        }
                        (None, None) => format!("failed '{}' check", failure.code),
                    };
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_errors(inner, &format!("{path}[{idx}]"), out);
                }
            }
        }
    }
}

/// Sink names must be unique
fn validate_sink_names(blueprint: &GestureBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for sink in &blueprint.sinks {
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

/// Check the input section against the selected source
fn validate_input(blueprint: &GestureBlueprint) -> Result<(), ContractError> {
    let input = &blueprint.input;

    match input.source {
        InputSource::Replay => {
            if input.path.as_ref().is_none_or(|p| p.as_os_str().is_empty()) {
                return Err(ContractError::config_validation(
                    "input.path",
                    "replay source requires a path",
                ));
            }
        }
        InputSource::Mock => {
            let mock = blueprint.mock_config();
            if mock.contacts > blueprint.tracker.touch_capacity {
                return Err(ContractError::config_validation(
                    "input.mock.contacts",
                    format!(
                        "mock contacts ({}) exceed touch_capacity ({})",
                        mock.contacts, blueprint.tracker.touch_capacity
                    ),
                ));
            }
        }
    }

    Ok(())
}

/// Network sinks need a target address up front
fn validate_network_sinks(blueprint: &GestureBlueprint) -> Result<(), ContractError> {
    for sink in &blueprint.sinks {
        if sink.sink_type != SinkType::Network {
            continue;
        }

        let field = format!("sinks[{}].params.addr", sink.name);
        let addr = sink
            .params
            .get("addr")
            .ok_or_else(|| ContractError::config_validation(&field, "network sink requires addr"))?;

        addr.parse::<SocketAddr>().map_err(|e| {
            ContractError::config_validation(&field, format!("invalid address '{addr}': {e}"))
        })?;
    }
    Ok(())
}
