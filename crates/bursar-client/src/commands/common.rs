use std::path::Path;

use crate::DEFAULT_USER_ID;
use crate::setup::{SetupContext, ensure_initialized, ensure_initialized_at};
use crate::{ClientError, ClientResult};

pub fn resolve_user(user: Option<&str>) -> String {
    user.map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string()
}

pub fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    if let Some(home) = home_override {
        return ensure_initialized_at(home);
    }
    ensure_initialized()
}

pub fn parse_status_filter(
    status: Option<&str>,
    allowed: &[&str],
    command: &str,
) -> ClientResult<Option<String>> {
    let Some(raw) = status else {
        return Ok(None);
    };
    let normalized = raw.trim().to_ascii_lowercase();
    if allowed.contains(&normalized.as_str()) {
        return Ok(Some(normalized));
    }
    Err(ClientError::invalid_argument_for_command(
        &format!("`--status` must be one of: {}.", allowed.join(", ")),
        Some(command),
    ))
}
