//! Judge endpoint settings and config-file loading.
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `LLEVAL_JUDGE_URL` | Generation endpoint (default: `http://localhost:8080/generate`) |
//! | `LLEVAL_JUDGE_RETRIES` | Attempts per prompt before giving up (default: 3) |
//! | `LLEVAL_JUDGE_BATCH_SIZE` | Prompts in flight at once (default: 16) |
//! | `LLEVAL_JUDGE_TIMEOUT` | Request timeout in seconds (default: 120) |
//! | `LLEVAL_SEED` | Seed for sampling and pairwise order randomization |

use crate::errors::{EvalError, EvalResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_num_retries")]
    pub num_retries: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_url() -> String {
    "http://localhost:8080/generate".to_string()
}

fn default_num_retries() -> u32 {
    3
}

fn default_batch_size() -> usize {
    16
}

fn default_timeout() -> u64 {
    120
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            num_retries: default_num_retries(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout(),
            seed: None,
        }
    }
}

impl JudgeConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("LLEVAL_JUDGE_URL").unwrap_or_else(|_| default_url()),
            num_retries: env_parse("LLEVAL_JUDGE_RETRIES").unwrap_or_else(default_num_retries),
            batch_size: env_parse("LLEVAL_JUDGE_BATCH_SIZE").unwrap_or_else(default_batch_size),
            timeout_secs: env_parse("LLEVAL_JUDGE_TIMEOUT").unwrap_or_else(default_timeout),
            seed: env_parse("LLEVAL_SEED"),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_num_retries(mut self, num_retries: u32) -> Self {
        self.num_retries = num_retries;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> EvalResult<()> {
        if self.url.trim().is_empty() {
            return Err(EvalError::config("judge url is empty"));
        }
        if self.num_retries == 0 {
            return Err(EvalError::config("num_retries must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(EvalError::config("batch_size must be at least 1"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Generation settings forwarded verbatim to the endpoint as `parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    #[serde(default = "default_gen_params")]
    pub gen_params: serde_json::Value,
}

fn default_gen_params() -> serde_json::Value {
    serde_json::json!({
        "max_new_tokens": 512,
        "temperature": 0.1,
        "do_sample": true,
    })
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            gen_params: default_gen_params(),
        }
    }
}

impl MetricConfig {
    pub fn load(path: &Path) -> EvalResult<Self> {
        load_document(path)
    }
}

/// Read a JSON document, or YAML when the extension is `.yaml` / `.yml`.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> EvalResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);
    if is_yaml {
        serde_yaml::from_str(&raw).map_err(|e| EvalError::parse(path, e.to_string()))
    } else {
        serde_json::from_str(&raw).map_err(|e| EvalError::parse(path, e.to_string()))
    }
}

/// Write pretty JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> EvalResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| EvalError::parse(path, e.to_string()))?;
    std::fs::write(path, json).map_err(|e| EvalError::io(path, e))
}
