use anyhow::Context;
use serde::Deserialize;

/// Settings come from an optional TOML file, then environment variables override them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub collection: CollectionConfig,
    pub thresholds: Thresholds,
    pub insights: InsightsConfig,
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5211,
            host: "0.0.0.0".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub interval_secs: u64,
    /// How long samples and alerts are kept in memory.
    pub retention_minutes: u64,
    /// Attached to every sample and used as the Prometheus `client_id` label.
    pub client_id: String,
    /// How often to log collection stats at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            retention_minutes: 1440,
            client_id: "default".into(),
            stats_log_interval_secs: 300,
        }
    }
}

/// Alert thresholds in percent. A breach of `threshold + critical_margin` or more is critical.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub critical_margin: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu: 80.0,
            memory: 80.0,
            disk: 90.0,
            critical_margin: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    pub enabled: bool,
    /// Local Ollama service when true, remote chain service otherwise.
    pub use_ollama: bool,
    pub ollama_url: String,
    pub ollama_model: String,
    pub langchain_url: String,
    /// Upper bound for one insight call, including connect.
    pub timeout_secs: u64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            use_ollama: false,
            ollama_url: "http://ollama:11434".into(),
            ollama_model: "llama2".into(),
            langchain_url: "http://langchain:7860".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub prometheus_enabled: bool,
    pub prometheus_url: String,
    pub docker_enabled: bool,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            prometheus_enabled: false,
            prometheus_url: "http://prometheus:9090".into(),
            docker_enabled: false,
        }
    }
}

/// Deployment environment variables and the config keys they override.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("CLIENT_ID", "collection.client_id"),
    ("COLLECTION_INTERVAL", "collection.interval_secs"),
    ("RETENTION_PERIOD", "collection.retention_minutes"),
    ("CPU_THRESHOLD", "thresholds.cpu"),
    ("MEMORY_THRESHOLD", "thresholds.memory"),
    ("DISK_THRESHOLD", "thresholds.disk"),
    ("ALERT_CRITICAL_MARGIN", "thresholds.critical_margin"),
    ("LLM_ENABLED", "insights.enabled"),
    ("USE_OLLAMA", "insights.use_ollama"),
    ("OLLAMA_API_URL", "insights.ollama_url"),
    ("OLLAMA_MODEL", "insights.ollama_model"),
    ("LANGCHAIN_API_URL", "insights.langchain_url"),
    ("LLM_TIMEOUT", "insights.timeout_secs"),
    ("PROMETHEUS_ENABLED", "integrations.prometheus_enabled"),
    ("PROMETHEUS_URL", "integrations.prometheus_url"),
    ("DOCKER_ENABLED", "integrations.docker_enabled"),
];

/// One year.
pub const MAX_RETENTION_MINUTES: u64 = 365 * 24 * 60;
/// One day.
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

impl AppConfig {
    /// Reads `CONFIG_FILE` (default `config.toml`), then applies environment overrides.
    /// A missing default file is not an error; a missing explicit `CONFIG_FILE` is.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = std::env::var("CONFIG_FILE").ok();
        let path = explicit.clone().unwrap_or_else(|| "config.toml".into());
        let file = config::File::new(&path, config::FileFormat::Toml).required(explicit.is_some());
        Self::build(file, |key| std::env::var(key).ok())
            .with_context(|| format!("loading configuration ({})", path))
    }

    /// Parse and validate config from a string (e.g. for tests). No environment overrides.
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        Self::load_from_str_with_env(s, |_| None)
    }

    /// Like [`AppConfig::load_from_str`], with environment variables read through `lookup`.
    pub fn load_from_str_with_env<F>(s: &str, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::build(config::File::from_str(s, config::FileFormat::Toml), lookup)
    }

    fn build<S, F>(source: S, lookup: F) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = config::Config::builder().add_source(source);
        for (var, key) in ENV_OVERRIDES {
            // Blank variables are treated as unset.
            let value = lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.collection.interval_secs > 0,
            "collection.interval_secs must be > 0, got {}",
            self.collection.interval_secs
        );
        anyhow::ensure!(
            self.collection.interval_secs <= MAX_INTERVAL_SECS,
            "collection.interval_secs must be <= {}, got {}",
            MAX_INTERVAL_SECS,
            self.collection.interval_secs
        );
        anyhow::ensure!(
            (1..=MAX_RETENTION_MINUTES).contains(&self.collection.retention_minutes),
            "collection.retention_minutes must be between 1 and {}, got {}",
            MAX_RETENTION_MINUTES,
            self.collection.retention_minutes
        );
        anyhow::ensure!(
            !self.collection.client_id.is_empty(),
            "collection.client_id must be non-empty"
        );
        anyhow::ensure!(
            self.collection.stats_log_interval_secs > 0,
            "collection.stats_log_interval_secs must be > 0, got {}",
            self.collection.stats_log_interval_secs
        );
        for (key, value) in [
            ("thresholds.cpu", self.thresholds.cpu),
            ("thresholds.memory", self.thresholds.memory),
            ("thresholds.disk", self.thresholds.disk),
        ] {
            anyhow::ensure!(
                (0.0..=100.0).contains(&value),
                "{} must be between 0 and 100, got {}",
                key,
                value
            );
        }
        anyhow::ensure!(
            self.thresholds.critical_margin >= 0.0,
            "thresholds.critical_margin must be >= 0, got {}",
            self.thresholds.critical_margin
        );
        if self.insights.enabled {
            anyhow::ensure!(
                self.insights.timeout_secs > 0,
                "insights.timeout_secs must be > 0, got {}",
                self.insights.timeout_secs
            );
            if self.insights.use_ollama {
                anyhow::ensure!(
                    !self.insights.ollama_url.is_empty(),
                    "insights.ollama_url must be non-empty"
                );
                anyhow::ensure!(
                    !self.insights.ollama_model.is_empty(),
                    "insights.ollama_model must be non-empty"
                );
            } else {
                anyhow::ensure!(
                    !self.insights.langchain_url.is_empty(),
                    "insights.langchain_url must be non-empty"
                );
            }
        }
        if self.integrations.prometheus_enabled {
            anyhow::ensure!(
                !self.integrations.prometheus_url.is_empty(),
                "integrations.prometheus_url must be non-empty"
            );
        }
        Ok(())
    }
}
