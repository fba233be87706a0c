//! Configuration management module
//!
//! `config.yaml` with one section per component. Durations are written as
//! humantime strings (`300ms`, `15s`, `1h`). A handful of `PAGEPILOT_*`
//! environment variables override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use action_primitives::ExecutorOptions;
use perceiver_structural::EngineOptions;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use window_orchestrator::{OrchestratorConfig, RetryPolicy};

use crate::errors::PagePilotError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSection,
    pub actions: ActionsSection,
    pub orchestrator: OrchestratorSection,
    pub http: HttpSection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    #[serde(with = "duration_str")]
    pub cache_ttl: Duration,
    #[serde(with = "duration_str")]
    pub ai_timeout: Duration,
}

impl Default for EngineSection {
    fn default() -> Self {
        let defaults = EngineOptions::default();
        Self {
            cache_ttl: defaults.cache_ttl,
            ai_timeout: defaults.model_timeout,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsSection {
    #[serde(with = "duration_str")]
    pub settle_delay: Duration,
    #[serde(with = "duration_str")]
    pub poll_interval: Duration,
    #[serde(with = "duration_str")]
    pub wait_timeout: Duration,
    pub history_capacity: usize,
    pub search_template: String,
}

impl Default for ActionsSection {
    fn default() -> Self {
        let defaults = ExecutorOptions::default();
        Self {
            settle_delay: defaults.settle_delay,
            poll_interval: defaults.poll_interval,
            wait_timeout: defaults.wait_timeout,
            history_capacity: defaults.history_capacity,
            search_template: defaults.search_url_template,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSection {
    pub retry_attempts: u32,
    #[serde(with = "duration_str")]
    pub load_timeout: Duration,
    #[serde(with = "duration_str")]
    pub first_settle: Duration,
    #[serde(with = "duration_str")]
    pub backoff_step: Duration,
    #[serde(with = "duration_str")]
    pub sweep_period: Duration,
    #[serde(with = "duration_str")]
    pub max_window_age: Duration,
    pub start_minimized: bool,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            retry_attempts: defaults.retry.max_attempts,
            load_timeout: defaults.retry.load_timeout,
            first_settle: defaults.retry.first_attempt_settle,
            backoff_step: defaults.retry.backoff_step,
            sweep_period: defaults.sweep_period,
            max_window_age: defaults.max_window_age,
            start_minimized: defaults.start_minimized,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub user_agent: String,
    #[serde(with = "duration_str")]
    pub timeout: Duration,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            user_agent: format!("pagepilot/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(20),
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self, PagePilotError> {
        serde_yaml::from_str(content).map_err(|err| PagePilotError::Config(err.to_string()))
    }

    /// Load from `explicit`, else `./config/config.yaml`, else the user
    /// config directory. A missing file yields defaults; environment
    /// overrides apply either way.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, PagePilotError> {
        let mut config = match find_config_file(explicit) {
            Some(path) => {
                let content = tokio::fs::read_to_string(&path).await.map_err(|err| {
                    PagePilotError::Config(format!("failed to read {}: {err}", path.display()))
                })?;
                let config = Self::from_yaml(&content)?;
                info!("Loaded configuration from: {}", path.display());
                config
            }
            None => {
                warn!("Config file not found, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `PAGEPILOT_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), PagePilotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PAGEPILOT_SEARCH_TEMPLATE") {
            self.actions.search_template = value;
        }
        if let Some(value) = lookup("PAGEPILOT_USER_AGENT") {
            self.http.user_agent = value;
        }
        if let Some(value) = lookup("PAGEPILOT_WAIT_TIMEOUT") {
            self.actions.wait_timeout = parse_override("PAGEPILOT_WAIT_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("PAGEPILOT_LOAD_TIMEOUT") {
            self.orchestrator.load_timeout = parse_override("PAGEPILOT_LOAD_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("PAGEPILOT_HTTP_TIMEOUT") {
            self.http.timeout = parse_override("PAGEPILOT_HTTP_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("PAGEPILOT_START_MINIMIZED") {
            self.orchestrator.start_minimized = value.parse().map_err(|_| {
                PagePilotError::Config(format!(
                    "PAGEPILOT_START_MINIMIZED must be true or false, got `{value}`"
                ))
            })?;
        }
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            cache_ttl: self.engine.cache_ttl,
            model_timeout: self.engine.ai_timeout,
            ..EngineOptions::default()
        }
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            settle_delay: self.actions.settle_delay,
            poll_interval: self.actions.poll_interval,
            wait_timeout: self.actions.wait_timeout,
            load_timeout: self.orchestrator.load_timeout,
            history_capacity: self.actions.history_capacity,
            search_url_template: self.actions.search_template.clone(),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let section = &self.orchestrator;
        OrchestratorConfig {
            retry: RetryPolicy {
                max_attempts: section.retry_attempts,
                load_timeout: section.load_timeout,
                first_attempt_settle: section.first_settle,
                backoff_step: section.backoff_step,
            },
            sweep_period: section.sweep_period,
            max_window_age: section.max_window_age,
            start_minimized: section.start_minimized,
            ..OrchestratorConfig::default()
        }
    }
}

fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("config").join("config.yaml");
    if local.exists() {
        return Some(local);
    }
    let mut user = dirs::config_dir()?;
    user.push("pagepilot");
    user.push("config.yaml");
    user.exists().then_some(user)
}

fn parse_override(key: &str, value: &str) -> Result<Duration, PagePilotError> {
    humantime::parse_duration(value)
        .map_err(|err| PagePilotError::Config(format!("{key}: invalid duration `{value}`: {err}")))
}

mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_component_defaults() {
        let config = Config::default();
        assert_eq!(config.actions.settle_delay, Duration::from_millis(300));
        assert_eq!(config.actions.history_capacity, 100);
        assert_eq!(config.orchestrator.retry_attempts, 3);
        assert_eq!(config.orchestrator.load_timeout, Duration::from_secs(15));
        assert_eq!(config.orchestrator.max_window_age, Duration::from_secs(3600));
        assert_eq!(config.orchestrator_config().retry, RetryPolicy::default());
        assert_eq!(config.executor_options().load_timeout, Duration::from_secs(15));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml(
            "actions:\n  settle_delay: 150ms\n  search_template: \"https://duckduckgo.com/html?q={query}\"\n\
             orchestrator:\n  backoff_step: 2s\n  sweep_period: 12h\n",
        )
        .unwrap();
        assert_eq!(config.actions.settle_delay, Duration::from_millis(150));
        assert_eq!(config.actions.poll_interval, Duration::from_millis(100));
        assert_eq!(
            config.executor_options().search_url_template,
            "https://duckduckgo.com/html?q={query}"
        );
        assert_eq!(config.orchestrator.backoff_step, Duration::from_secs(2));
        assert_eq!(config.orchestrator.sweep_period, Duration::from_secs(12 * 3600));
        assert_eq!(config.http, HttpSection::default());
    }

    #[test]
    fn bad_durations_are_config_errors() {
        let err = Config::from_yaml("engine:\n  cache_ttl: soon\n").unwrap_err();
        assert!(matches!(err, PagePilotError::Config(_)));
    }

    #[test]
    fn overrides_come_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("PAGEPILOT_WAIT_TIMEOUT", "3s"),
            ("PAGEPILOT_START_MINIMIZED", "false"),
            ("PAGEPILOT_USER_AGENT", "pagepilot-test/1.0"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(config.actions.wait_timeout, Duration::from_secs(3));
        assert!(!config.orchestrator.start_minimized);
        assert_eq!(config.http.user_agent, "pagepilot-test/1.0");

        let err = config
            .apply_overrides(|key| (key == "PAGEPILOT_LOAD_TIMEOUT").then(|| "fast".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("PAGEPILOT_LOAD_TIMEOUT"));
    }

    #[tokio::test]
    #[serial]
    async fn load_reads_an_explicit_file_and_the_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "http:\n  timeout: 5s\n").unwrap();

        std::env::set_var("PAGEPILOT_SEARCH_TEMPLATE", "https://search.test/?q={query}");
        let config = Config::load(Some(&path)).await;
        std::env::remove_var("PAGEPILOT_SEARCH_TEMPLATE");

        let config = config.unwrap();
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.actions.search_template, "https://search.test/?q={query}");
    }

    #[test]
    fn round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("settle_delay: 300ms"));
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }
}
