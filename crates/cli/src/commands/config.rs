use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use proforma_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_OK};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: EXIT_CONFIG,
                output: format!("config validation failed: {error}"),
            }
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "crm.base_url",
        &config.crm.base_url,
        source("crm.base_url", "PROFORMA_CRM_BASE_URL"),
    ));
    lines.push(render_line(
        "crm.access_token",
        &redact_token(config.crm.access_token.expose_secret()),
        source("crm.access_token", "PROFORMA_CRM_ACCESS_TOKEN"),
    ));
    lines.push(render_line(
        "crm.request_timeout_secs",
        &config.crm.request_timeout_secs.to_string(),
        source("crm.request_timeout_secs", "PROFORMA_CRM_REQUEST_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "render.webhook_url",
        &config.render.webhook_url,
        source("render.webhook_url", "PROFORMA_RENDER_WEBHOOK_URL"),
    ));
    lines.push(render_line(
        "render.request_timeout_secs",
        &config.render.request_timeout_secs.to_string(),
        source("render.request_timeout_secs", "PROFORMA_RENDER_REQUEST_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "watch.interval_secs",
        &config.watch.interval_secs.to_string(),
        source("watch.interval_secs", "PROFORMA_WATCH_INTERVAL_SECS"),
    ));
    lines.push(render_line(
        "watch.max_attempts",
        &config.watch.max_attempts.to_string(),
        source("watch.max_attempts", "PROFORMA_WATCH_MAX_ATTEMPTS"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "PROFORMA_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "PROFORMA_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", "PROFORMA_SERVER_GRACEFUL_SHUTDOWN_SECS"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "PROFORMA_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "PROFORMA_LOGGING_FORMAT"),
    ));

    CommandResult { exit_code: EXIT_OK, output: lines.join("\n") }
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("proforma.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/proforma.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
