//! Configuration validation
//!
//! Rules:
//! - field rules declared on the schema (`validator` derive)
//! - backend names unique

use std::collections::HashSet;

use contracts::ContractError;
use validator::Validate;

use crate::FederationConfig;

/// Validate a federation configuration
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &FederationConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("config", e.to_string()))?;
    validate_backend_names(config)?;
    Ok(())
}

/// Backend names are unique
fn validate_backend_names(config: &FederationConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, backend) in config.backends.iter().enumerate() {
        if !seen.insert(backend.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("backends[{idx}].name"),
                format!("duplicate backend name '{}'", backend.name),
            ));
        }
    }
    Ok(())
}
