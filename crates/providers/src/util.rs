//! Shared utility functions for provider adapters.

use std::time::Duration;

use relay_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Read a credential from the environment variable `env_var`.
///
/// Called right before each outbound request so a missing credential is a
/// [`Error::Config`] raised at first use, never at startup, and never after
/// a request has gone out.
pub(crate) fn resolve_credential(env_var: &str) -> Result<String> {
    match std::env::var(env_var) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(Error::Config(format!(
            "environment variable '{env_var}' not set or empty"
        ))),
    }
}

/// Build an HTTP client. Without `timeout_ms` requests may wait forever.
pub(crate) fn build_client(timeout_ms: Option<u64>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(ms) = timeout_ms {
        builder = builder.timeout(Duration::from_millis(ms));
    }
    builder.build().map_err(from_reqwest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_credential_reads_env() {
        let var_name = "RELAY_TEST_RESOLVE_CREDENTIAL_1234";
        std::env::set_var(var_name, "secret-value");
        assert_eq!(resolve_credential(var_name).unwrap(), "secret-value");
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_credential_missing_is_config_error() {
        let err = resolve_credential("RELAY_TEST_NONEXISTENT_VAR_8888").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("RELAY_TEST_NONEXISTENT_VAR_8888"));
    }

    #[test]
    fn resolve_credential_blank_is_config_error() {
        let var_name = "RELAY_TEST_BLANK_CREDENTIAL_5555";
        std::env::set_var(var_name, "  ");
        assert!(matches!(resolve_credential(var_name), Err(Error::Config(_))));
        std::env::remove_var(var_name);
    }
}
