//! Validation for the pane client section.

use std::collections::HashSet;

use crate::schema::PanesConfig;

use super::helpers::{validate_range, validate_session_key, validate_url_scheme};

pub(crate) fn validate_client(errors: &mut Vec<String>, config: &PanesConfig) {
    let client = &config.client;
    validate_url_scheme(
        errors,
        "client.backend_url",
        &client.backend_url,
        &["ws://", "wss://"],
    );
    validate_range(errors, "client.cols", u32::from(client.cols), 2, 1000);
    validate_range(errors, "client.rows", u32::from(client.rows), 1, 500);
    validate_range(
        errors,
        "client.scrollback_lines",
        client.scrollback_lines,
        100,
        1_000_000,
    );
}

pub(crate) fn validate_panes(errors: &mut Vec<String>, config: &PanesConfig) {
    if config.client.panes.is_empty() {
        errors.push("client.panes must list at least one pane".into());
    }

    let mut seen = HashSet::new();
    for pane in &config.client.panes {
        validate_session_key(errors, "client.panes.key", &pane.key);
        if !seen.insert(pane.key.as_str()) {
            errors.push(format!("client.panes has duplicate key {:?}", pane.key));
        }
    }
}
