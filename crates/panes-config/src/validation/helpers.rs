//! Shared validation helpers used by all domain validators.

use panes_common::SessionKey;

/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error unless `url` starts with one of `schemes`.
pub(crate) fn validate_url_scheme(errors: &mut Vec<String>, name: &str, url: &str, schemes: &[&str]) {
    if !schemes.iter().any(|s| url.starts_with(s)) {
        errors.push(format!(
            "{name} = {url:?} must start with one of {}",
            schemes.join(", ")
        ));
    }
}

/// Push an error if `key` cannot be used as a session key.
pub(crate) fn validate_session_key(errors: &mut Vec<String>, name: &str, key: &str) {
    if let Err(e) = SessionKey::new(key) {
        errors.push(format!("{name}: {e}"));
    }
}
