use std::env;

use anyhow::{anyhow, Result};

/// The tool host refuses sessions unless these identifiers are present in
/// the environment. They are consumed by the server, not by us; we only
/// check for them so a misconfigured session fails before connecting.
const REQUIRED_HOST_VARS: [&str; 3] = ["PORTER_PROJECT_ID", "PORTER_USER", "PORTER_SIGNING_KEY"];

pub fn validate_host_env() -> Result<()> {
    let missing: Vec<&str> = REQUIRED_HOST_VARS
        .iter()
        .copied()
        .filter(|key| env::var(key).map_or(true, |value| value.is_empty()))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(
            "missing required environment variables: {}",
            missing.join(", ")
        ))
    }
}
