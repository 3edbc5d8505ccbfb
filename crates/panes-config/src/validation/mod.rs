//! Full configuration validation.
//!
//! Each domain has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod client;
mod helpers;
mod network;

#[cfg(test)]
mod tests;

use crate::schema::PanesConfig;
use panes_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &PanesConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    network::validate_server(&mut errors, config);
    network::validate_agents(&mut errors, config);
    network::validate_execute(&mut errors, config);
    client::validate_client(&mut errors, config);
    client::validate_panes(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
