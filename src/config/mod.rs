use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `PIPELINE_CONTROLLER__WEB__PORT=8080`
pub const ENV_PREFIX: &str = "PIPELINE_CONTROLLER";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub execution: ExecutionConfig,
    pub registry: RegistryConfig,
    pub broadcast: BroadcastConfig,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Upper bound for a single stage; unset means a stage may run forever
    pub stage_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub on_duplicate: DuplicatePolicy,
}

/// What `create` does when the pipeline name is already registered
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Events buffered per subscriber before new ones are dropped
    pub subscriber_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub simulated_stage_duration_ms: u64,
    /// Stages the simulated runner reports as failed
    #[serde(default)]
    pub fail_stages: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            execution: ExecutionConfig::default(),
            registry: RegistryConfig::default(),
            broadcast: BroadcastConfig {
                subscriber_buffer: 256,
            },
            runner: RunnerConfig {
                simulated_stage_duration_ms: 2000,
                fail_stages: Vec::new(),
            },
        }
    }
}

impl ExecutionConfig {
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}

impl RunnerConfig {
    pub fn simulated_stage_duration(&self) -> Duration {
        Duration::from_millis(self.simulated_stage_duration_ms)
    }
}

impl Config {
    /// Load configuration from `config_file`, writing the defaults there first
    /// if the file does not exist. Environment variables prefixed with
    /// [`ENV_PREFIX`] override both.
    pub fn load(config_file: &str) -> Result<Self> {
        if !Path::new(config_file).exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(config_file, contents)
                .with_context(|| format!("Failed to write default config to {}", config_file))?;
        }

        Self::builder()?
            .add_source(::config::File::new(config_file, ::config::FileFormat::Toml))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .with_context(|| format!("Failed to load configuration from {}", config_file))
    }

    fn builder() -> Result<::config::ConfigBuilder<::config::builder::DefaultState>> {
        let defaults = Self::default();
        let builder = ::config::Config::builder()
            .set_default("web.host", defaults.web.host)?
            .set_default("web.port", i64::from(defaults.web.port))?
            .set_default("registry.on_duplicate", "reject")?
            .set_default(
                "broadcast.subscriber_buffer",
                defaults.broadcast.subscriber_buffer as i64,
            )?
            .set_default(
                "runner.simulated_stage_duration_ms",
                defaults.runner.simulated_stage_duration_ms as i64,
            )?;
        Ok(builder)
    }
}
