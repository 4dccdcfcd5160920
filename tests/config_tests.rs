// Config loading, validation and environment override tests

use resource_watcher::config::{AppConfig, MAX_INTERVAL_SECS, MAX_RETENTION_MINUTES};
use std::collections::HashMap;

const VALID_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[collection]
interval_secs = 30
retention_minutes = 120
client_id = "edge-01"
stats_log_interval_secs = 60

[thresholds]
cpu = 75.0
memory = 85.0
disk = 90.0
critical_margin = 10.0

[insights]
enabled = false
use_ollama = true
ollama_url = "http://localhost:11434"
ollama_model = "llama3"
langchain_url = "http://localhost:7860"
timeout_secs = 20

[integrations]
prometheus_enabled = true
prometheus_url = "http://localhost:9090"
docker_enabled = false
"#;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.collection.interval_secs, 30);
    assert_eq!(config.collection.retention_minutes, 120);
    assert_eq!(config.collection.client_id, "edge-01");
    assert_eq!(config.thresholds.cpu, 75.0);
    assert_eq!(config.thresholds.memory, 85.0);
    assert!(config.insights.use_ollama);
    assert_eq!(config.insights.ollama_model, "llama3");
    assert_eq!(config.insights.timeout_secs, 20);
    assert!(config.integrations.prometheus_enabled);
}

#[test]
fn test_config_defaults_when_sections_omitted() {
    let config = AppConfig::load_from_str("").expect("empty config is valid");
    assert_eq!(config.server.port, 5211);
    assert_eq!(config.collection.interval_secs, 60);
    assert_eq!(config.collection.retention_minutes, 1440);
    assert_eq!(config.collection.client_id, "default");
    assert_eq!(config.thresholds.cpu, 80.0);
    assert_eq!(config.thresholds.memory, 80.0);
    assert_eq!(config.thresholds.disk, 90.0);
    assert_eq!(config.thresholds.critical_margin, 10.0);
    assert!(!config.insights.enabled);
    assert_eq!(config.insights.ollama_url, "http://ollama:11434");
    assert_eq!(config.insights.ollama_model, "llama2");
    assert_eq!(config.insights.langchain_url, "http://langchain:7860");
    assert_eq!(config.insights.timeout_secs, 30);
    assert!(!config.integrations.prometheus_enabled);
    assert_eq!(config.integrations.prometheus_url, "http://prometheus:9090");
    assert!(!config.integrations.docker_enabled);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8081", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_interval_zero() {
    let bad = VALID_CONFIG.replace("interval_secs = 30", "interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("collection.interval_secs"));
}

#[test]
fn test_config_validation_rejects_retention_zero() {
    let bad = VALID_CONFIG.replace("retention_minutes = 120", "retention_minutes = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("retention_minutes"));
}

#[test]
fn test_config_validation_rejects_empty_client_id() {
    let bad = VALID_CONFIG.replace("client_id = \"edge-01\"", "client_id = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("client_id"));
}

#[test]
fn test_config_validation_rejects_threshold_above_100() {
    let bad = VALID_CONFIG.replace("cpu = 75.0", "cpu = 150.0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("thresholds.cpu"));
}

#[test]
fn test_config_validation_rejects_negative_margin() {
    let bad = VALID_CONFIG.replace("critical_margin = 10.0", "critical_margin = -1.0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("critical_margin"));
}

#[test]
fn test_config_validation_checks_insight_backend_only_when_enabled() {
    let disabled = VALID_CONFIG.replace("ollama_model = \"llama3\"", "ollama_model = \"\"");
    assert!(AppConfig::load_from_str(&disabled).is_ok());

    let enabled = disabled.replace("enabled = false", "enabled = true");
    let err = AppConfig::load_from_str(&enabled).unwrap_err();
    assert!(err.to_string().contains("insights.ollama_model"));
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_env_overrides_file_values() {
    let config = AppConfig::load_from_str_with_env(
        VALID_CONFIG,
        env(&[
            ("PORT", "9000"),
            ("CLIENT_ID", "rack-7"),
            ("COLLECTION_INTERVAL", "15"),
            ("RETENTION_PERIOD", "60"),
            ("CPU_THRESHOLD", "70.5"),
            ("DISK_THRESHOLD", "95"),
            ("LLM_ENABLED", "true"),
            ("USE_OLLAMA", "false"),
            ("LANGCHAIN_API_URL", "http://chain:7860"),
            ("LLM_TIMEOUT", "5"),
            ("DOCKER_ENABLED", "true"),
        ]),
    )
    .expect("overrides");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.collection.client_id, "rack-7");
    assert_eq!(config.collection.interval_secs, 15);
    assert_eq!(config.collection.retention_minutes, 60);
    assert_eq!(config.thresholds.cpu, 70.5);
    assert_eq!(config.thresholds.memory, 85.0);
    assert_eq!(config.thresholds.disk, 95.0);
    assert!(config.insights.enabled);
    assert!(!config.insights.use_ollama);
    assert_eq!(config.insights.langchain_url, "http://chain:7860");
    assert_eq!(config.insights.timeout_secs, 5);
    assert!(config.integrations.docker_enabled);
}

#[test]
fn test_config_env_overrides_apply_without_file_values() {
    let config = AppConfig::load_from_str_with_env(
        "",
        env(&[("MEMORY_THRESHOLD", "65"), ("PROMETHEUS_ENABLED", "true")]),
    )
    .expect("overrides on defaults");
    assert_eq!(config.thresholds.memory, 65.0);
    assert_eq!(config.thresholds.cpu, 80.0);
    assert!(config.integrations.prometheus_enabled);
    assert_eq!(config.integrations.prometheus_url, "http://prometheus:9090");
}

#[test]
fn test_config_env_blank_values_are_ignored() {
    let config =
        AppConfig::load_from_str_with_env(VALID_CONFIG, env(&[("PORT", "  "), ("CLIENT_ID", "")]))
            .expect("overrides");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.collection.client_id, "edge-01");
}

#[test]
fn test_config_env_rejects_unparsable_values() {
    assert!(
        AppConfig::load_from_str_with_env(VALID_CONFIG, env(&[("CPU_THRESHOLD", "high")]))
            .is_err()
    );
    assert!(
        AppConfig::load_from_str_with_env(VALID_CONFIG, env(&[("LLM_ENABLED", "maybe")]))
            .is_err()
    );
}

#[test]
fn test_config_env_values_are_validated() {
    let err = AppConfig::load_from_str_with_env(VALID_CONFIG, env(&[("DISK_THRESHOLD", "120")]))
        .unwrap_err();
    assert!(err.to_string().contains("thresholds.disk"));
}

#[test]
fn test_config_validation_rejects_retention_beyond_one_year() {
    let bad = VALID_CONFIG.replace(
        "retention_minutes = 120",
        "retention_minutes = 999999999999999",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("collection.retention_minutes"));

    let err = AppConfig::load_from_str_with_env(
        VALID_CONFIG,
        env(&[("RETENTION_PERIOD", "999999999999999")]),
    )
    .unwrap_err();
    assert!(err.to_string().contains("collection.retention_minutes"));

    let max = format!("retention_minutes = {}", MAX_RETENTION_MINUTES);
    let ok = VALID_CONFIG.replace("retention_minutes = 120", &max);
    assert!(AppConfig::load_from_str(&ok).is_ok());
}

#[test]
fn test_config_validation_rejects_interval_beyond_one_day() {
    let err = AppConfig::load_from_str_with_env(
        VALID_CONFIG,
        env(&[("COLLECTION_INTERVAL", "18446744073709551")]),
    )
    .unwrap_err();
    assert!(err.to_string().contains("collection.interval_secs"));

    let max = format!("interval_secs = {}", MAX_INTERVAL_SECS);
    let ok = VALID_CONFIG.replace("interval_secs = 30", &max);
    assert!(AppConfig::load_from_str(&ok).is_ok());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.collection.retention_minutes, 120);
    assert_eq!(config.insights.ollama_model, "llama3");
}
