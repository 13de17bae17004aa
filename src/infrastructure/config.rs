use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const APP_JSON: &str = "app.json";
const DEFAULT_API_BASE_URL: &str = "https://api.taskbrief.example/v1";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_LIST_STALE_MINUTES: i64 = 5;

/// How the client proves itself to the refresh endpoint. Stored mode keeps
/// the refresh token in the OS keychain and sends it in the request body;
/// cookie mode relies on the HTTP-only cookie the server set at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    Stored,
    Cookie,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub refresh_mode: RefreshMode,
    pub list_stale_minutes: i64,
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let defaults = serde_json::json!({
            "schema": 1,
            "appName": "TaskBrief",
            "apiBaseUrl": DEFAULT_API_BASE_URL,
            "requestTimeoutSeconds": DEFAULT_REQUEST_TIMEOUT_SECONDS,
            "refreshMode": "stored",
            "listStaleMinutes": DEFAULT_LIST_STALE_MINUTES,
        });
        let formatted = serde_json::to_string_pretty(&defaults)?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_client_config(config_dir: &Path) -> Result<ClientConfig, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;

    let api_base_url = app
        .get("apiBaseUrl")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL)
        .to_string();

    let timeout_seconds = app
        .get("requestTimeoutSeconds")
        .and_then(serde_json::Value::as_u64)
        .filter(|seconds| *seconds > 0)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS);

    let refresh_mode = match app.get("refreshMode").and_then(serde_json::Value::as_str) {
        None => RefreshMode::Stored,
        Some("stored") => RefreshMode::Stored,
        Some("cookie") => RefreshMode::Cookie,
        Some(other) => {
            return Err(InfraError::InvalidConfig(format!(
                "unknown refreshMode {other:?}; expected \"stored\" or \"cookie\""
            )));
        }
    };

    let list_stale_minutes = app
        .get("listStaleMinutes")
        .and_then(serde_json::Value::as_i64)
        .filter(|minutes| *minutes >= 0)
        .unwrap_or(DEFAULT_LIST_STALE_MINUTES);

    Ok(ClientConfig {
        api_base_url,
        request_timeout: Duration::from_secs(timeout_seconds),
        refresh_mode,
        list_stale_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_app_json(dir: &Path, body: &str) {
        fs::write(dir.join(APP_JSON), body).expect("write app.json");
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("taskbrief-config-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn defaults_are_written_once_and_parse_back() {
        let dir = temp_dir("defaults");
        ensure_default_configs(&dir).expect("write defaults");
        let config = load_client_config(&dir).expect("load defaults");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.refresh_mode, RefreshMode::Stored);
        assert_eq!(config.list_stale_minutes, 5);

        write_app_json(&dir, r#"{"schema":1,"refreshMode":"cookie"}"#);
        ensure_default_configs(&dir).expect("no overwrite");
        let config = load_client_config(&dir).expect("load edited");
        assert_eq!(config.refresh_mode, RefreshMode::Cookie);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = temp_dir("partial");
        write_app_json(&dir, r#"{"schema":1,"apiBaseUrl":"https://staging.taskbrief.example"}"#);
        let config = load_client_config(&dir).expect("load partial");
        assert_eq!(config.api_base_url, "https://staging.taskbrief.example");
        assert_eq!(config.refresh_mode, RefreshMode::Stored);
        assert_eq!(config.list_stale_minutes, 5);
    }

    #[test]
    fn unknown_refresh_mode_is_rejected() {
        let dir = temp_dir("badmode");
        write_app_json(&dir, r#"{"schema":1,"refreshMode":"session"}"#);
        assert!(load_client_config(&dir).is_err());
    }

    #[test]
    fn unsupported_schema_is_rejected() {
        let dir = temp_dir("schema");
        write_app_json(&dir, r#"{"schema":2}"#);
        assert!(load_client_config(&dir).is_err());
    }
}
