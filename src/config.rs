use dotenvy;
use std::{
    env,
    path::PathBuf,
    str::FromStr,
    time::Duration
};

use crate::{
    error::ConfigError,
    recency::RecencyRule
};

const ENV_FILE: &str = "research_assistant.env";

pub const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";
// we hardcode the default bedrock model as each model has different input schemas.
pub const BEDROCK_MODEL_ID: &str = "us.amazon.nova-lite-v1:0";

#[derive(Debug, Clone)]
pub struct ArxivConfig {
    pub endpoint: String,
    pub max_results: u32,
    pub timeout: Duration,
    pub recency_years: u32,
    pub recency_rule: RecencyRule,
    pub user_agent: String,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        ArxivConfig {
            endpoint: String::from(ARXIV_API_URL),
            max_results: 5,
            timeout: Duration::from_secs(10),
            recency_years: 5,
            recency_rule: RecencyRule::Elapsed,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        }
    }
}

impl ArxivConfig {
    /// Default settings against another endpoint, mostly for mock servers.
    pub fn with_endpoint(endpoint: &str) -> Self {
        ArxivConfig {
            endpoint: endpoint.to_string(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(ArxivConfig {
            endpoint: env::var("ARXIV_ENDPOINT").unwrap_or(defaults.endpoint),
            max_results: get_positive_from_env("MAX_RESULTS", defaults.max_results)?,
            timeout: Duration::from_secs(
                get_positive_from_env("REQUEST_TIMEOUT_SECS", defaults.timeout.as_secs())?
            ),
            recency_years: get_positive_from_env("RECENCY_YEARS", defaults.recency_years)?,
            recency_rule: get_from_env("RECENCY_RULE", defaults.recency_rule)?,
            user_agent: defaults.user_agent
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    #[default]
    OpenAI,
    Bedrock,
}

impl FromStr for ModelBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ModelBackend::OpenAI),
            "bedrock" => Ok(ModelBackend::Bedrock),
            _ => Err(ConfigError::new("MODEL_BACKEND", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub backend: ModelBackend,
    pub model_name: String,
    pub max_summary_length: u32,
    pub max_future_research_length: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::for_backend(ModelBackend::OpenAI)
    }
}

impl ModelConfig {
    pub fn for_backend(backend: ModelBackend) -> Self {
        let model_name = match backend {
            ModelBackend::OpenAI => OPENAI_MODEL,
            ModelBackend::Bedrock => BEDROCK_MODEL_ID,
        };
        ModelConfig {
            backend,
            model_name: model_name.to_string(),
            max_summary_length: 300,
            max_future_research_length: 300
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = get_from_env("MODEL_BACKEND", ModelBackend::default())?;
        let defaults = Self::for_backend(backend);
        Ok(ModelConfig {
            backend,
            model_name: env::var("MODEL_NAME").unwrap_or(defaults.model_name),
            max_summary_length: get_positive_from_env(
                "MAX_SUMMARY_LENGTH", defaults.max_summary_length)?,
            max_future_research_length: get_positive_from_env(
                "MAX_FUTURE_RESEARCH_LENGTH", defaults.max_future_research_length)?
        })
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("papers.jsonl")
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        env::var("STORE_PATH")
            .map(|path| StoreConfig { path: PathBuf::from(path) })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub arxiv: ArxivConfig,
    pub model: ModelConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Reads `research_assistant.env` when present, then the process environment.
    /// Unset keys keep their defaults; set but invalid keys are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::from_filename(ENV_FILE) {
            if !e.not_found() {
                return Err(ConfigError::new(ENV_FILE, &e.to_string()));
            }
        }
        Ok(AppConfig {
            arxiv: ArxivConfig::from_env()?,
            model: ModelConfig::from_env()?,
            store: StoreConfig::from_env()
        })
    }
}

fn get_from_env<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::new(key, &raw)),
        Err(_) => Ok(default),
    }
}

fn get_positive_from_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default + ToString,
{
    let var = get_from_env(key, default)?;
    if var <= T::default() {
        return Err(ConfigError::new(key, &var.to_string()));
    }
    Ok(var)
}
