use std::env;
use std::fs;
use std::path::Path;

use clusterpilot_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_key(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let fields = vec![
        field("warehouse.url", config.warehouse.url.clone(), &["CLUSTERPILOT_WAREHOUSE_URL"]),
        field(
            "warehouse.table",
            config.warehouse.table.clone(),
            &["CLUSTERPILOT_WAREHOUSE_TABLE"],
        ),
        field(
            "warehouse.max_connections",
            config.warehouse.max_connections.to_string(),
            &["CLUSTERPILOT_WAREHOUSE_MAX_CONNECTIONS"],
        ),
        field(
            "warehouse.timeout_secs",
            config.warehouse.timeout_secs.to_string(),
            &["CLUSTERPILOT_WAREHOUSE_TIMEOUT_SECS"],
        ),
        field(
            "llm.provider",
            format!("{:?}", config.llm.provider),
            &["CLUSTERPILOT_LLM_PROVIDER"],
        ),
        field("llm.api_key", api_key, &["CLUSTERPILOT_LLM_API_KEY", "GEMINI_API_KEY"]),
        field("llm.base_url", config.llm.base_url.clone(), &["CLUSTERPILOT_LLM_BASE_URL"]),
        field("llm.model", config.llm.model.clone(), &["CLUSTERPILOT_LLM_MODEL"]),
        field(
            "llm.temperature",
            config.llm.temperature.to_string(),
            &["CLUSTERPILOT_LLM_TEMPERATURE"],
        ),
        field(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["CLUSTERPILOT_LLM_TIMEOUT_SECS"],
        ),
        field(
            "llm.max_retries",
            config.llm.max_retries.to_string(),
            &["CLUSTERPILOT_LLM_MAX_RETRIES"],
        ),
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["CLUSTERPILOT_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["CLUSTERPILOT_SERVER_PORT"]),
        field(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["CLUSTERPILOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["CLUSTERPILOT_LOGGING_LEVEL", "CLUSTERPILOT_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["CLUSTERPILOT_LOGGING_FORMAT", "CLUSTERPILOT_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for Field { key, value, env_keys } in fields {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

fn field(key: &'static str, value: String, env_keys: &'static [&'static str]) -> Field {
    Field { key, value, env_keys }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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

/// Keeps the last four characters of long keys so operators can tell keys apart.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    let length = trimmed.chars().count();
    if length == 0 {
        return "<empty>".to_string();
    }
    if length < 12 {
        return "<redacted>".to_string();
    }
    let tail: String = trimmed.chars().skip(length - 4).collect();
    format!("***{tail}")
}
