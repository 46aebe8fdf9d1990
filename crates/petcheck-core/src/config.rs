//! Harness configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::assertion::{DEFAULT_LATENCY_BUDGET_MS, SEARCH_LATENCY_BUDGET_MS};
use crate::factory::PetOverrides;

/// Files probed by [`Config::load_default`], in order.
pub const DEFAULT_CONFIG_FILES: [&str; 3] = [".petcheck.toml", ".petcheck.json", "petcheck.toml"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the pet service, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Extra headers sent with every request (e.g. `api_key`)
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Latency budget for single-pet requests
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: f64,

    /// Latency budget for filter queries
    #[serde(default = "default_search_latency_budget_ms")]
    pub search_latency_budget_ms: f64,

    /// Treat a 404 on the post-create/post-update re-read as a tolerated
    /// service anomaly instead of a failure
    #[serde(default = "default_true")]
    pub tolerate_known_anomalies: bool,

    /// Field overrides for the generated scenario pet
    #[serde(default)]
    pub pet: PetOverrides,
}

fn default_base_url() -> String {
    "https://petstore.swagger.io/v2".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_latency_budget_ms() -> f64 {
    DEFAULT_LATENCY_BUDGET_MS
}

const fn default_search_latency_budget_ms() -> f64 {
    SEARCH_LATENCY_BUDGET_MS
}

const fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            headers: HashMap::new(),
            timeout_secs: default_timeout_secs(),
            latency_budget_ms: default_latency_budget_ms(),
            search_latency_budget_ms: default_search_latency_budget_ms(),
            tolerate_known_anomalies: true,
            pet: PetOverrides::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML or JSON file (by extension).
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the first of [`DEFAULT_CONFIG_FILES`] found in `dir`, or defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but is invalid
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        for name in DEFAULT_CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load from the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but is invalid
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// Reject values no run could succeed with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https://, got \"{}\"",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be > 0".into()));
        }
        for (key, value) in [
            ("latency_budget_ms", self.latency_budget_ms),
            ("search_latency_budget_ms", self.search_latency_budget_ms),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{key} must be > 0, got {value}")));
            }
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed.
    #[must_use]
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Create example config file
    #[must_use]
    pub fn example() -> &'static str {
        r#"# petcheck configuration

# Pet service under test
base_url = "https://petstore.swagger.io/v2"

# Per-request timeout (seconds)
timeout_secs = 10

# Latency budgets (milliseconds); a response must be strictly faster
latency_budget_ms = 2000
search_latency_budget_ms = 3000

# The public service sometimes answers 404 right after a successful
# create/update. Set to false to fail the run on it instead.
tolerate_known_anomalies = true

# Extra headers sent with every request
[headers]
# api_key = "special-key"

# Overrides for the generated pet (whole top-level fields)
[pet]
# id = 12345
# name = "Rex"
# status = "available"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
