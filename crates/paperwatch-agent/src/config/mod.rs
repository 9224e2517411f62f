//! Configuration loading for Paperwatch.
//! Reads paperwatch.toml from the current directory or the path in PAPERWATCH_CONFIG.

use std::path::{Path, PathBuf};
use std::time::Duration;

use paperwatch_common::{FetchFilter, SourceTag, Topic};
use paperwatch_digest::DigestFormat;
use paperwatch_llm::backend::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const CONFIG_ENV: &str = "PAPERWATCH_CONFIG";
pub const API_KEY_ENV: &str = "PAPERWATCH_LLM_API_KEY";
const DEFAULT_CONFIG_PATH: &str = "paperwatch.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub digest: DigestConfig,
    /// Summaries are skipped entirely when absent.
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf { PathBuf::from("./data/paperwatch.db") }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceTag>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub min_engagement: u64,
    /// Per HTTP call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Per source, covering every page and retry.
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
    #[serde(default)]
    pub concurrent: bool,
    #[serde(default = "default_max_summaries")]
    pub max_summaries: usize,
    #[serde(default)]
    pub arxiv: ArxivConfig,
    #[serde(default)]
    pub papers_with_code: PapersWithCodeConfig,
    #[serde(default)]
    pub hugging_face: HuggingFaceConfig,
}

fn default_days_back()           -> u32            { 7 }
fn default_sources()             -> Vec<SourceTag> { SourceTag::ALL.to_vec() }
fn default_timeout_secs()        -> u64            { 30 }
fn default_source_timeout_secs() -> u64            { 120 }
fn default_max_summaries()       -> usize          { 10 }

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            days_back: default_days_back(),
            sources: default_sources(),
            topics: Vec::new(),
            keywords: Vec::new(),
            min_engagement: 0,
            timeout_secs: default_timeout_secs(),
            source_timeout_secs: default_source_timeout_secs(),
            concurrent: false,
            max_summaries: default_max_summaries(),
            arxiv: ArxivConfig::default(),
            papers_with_code: PapersWithCodeConfig::default(),
            hugging_face: HuggingFaceConfig::default(),
        }
    }
}

impl IngestionConfig {
    pub fn filter(&self) -> FetchFilter {
        FetchFilter {
            days_back: self.days_back,
            topics: self.topics.clone(),
            min_engagement: self.min_engagement,
            sources: self.sources.clone(),
            keywords: self.keywords.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivConfig {
    #[serde(default = "default_arxiv_rps")]
    pub requests_per_second: f64,
    #[serde(default = "default_arxiv_max_results")]
    pub max_results: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

// arXiv asks for no more than one request every three seconds
fn default_arxiv_rps()         -> f64   { 0.33 }
fn default_arxiv_max_results() -> usize { 200 }
fn default_page_size()         -> usize { 100 }
fn default_rps()               -> f64   { 1.0 }

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_arxiv_rps(),
            max_results: default_arxiv_max_results(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PapersWithCodeConfig {
    #[serde(default = "default_rps")]
    pub requests_per_second: f64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PapersWithCodeConfig {
    fn default() -> Self {
        Self { requests_per_second: default_rps(), page_size: default_page_size() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    #[serde(default = "default_rps")]
    pub requests_per_second: f64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self { requests_per_second: default_rps() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_formats")]
    pub formats: Vec<DigestFormat>,
}

fn default_top_n()      -> usize             { 10 }
fn default_output_dir() -> PathBuf           { PathBuf::from("./digests") }
fn default_formats()    -> Vec<DigestFormat> { DigestFormat::ALL.to_vec() }

impl Default for DigestConfig {
    fn default() -> Self {
        Self { top_n: default_top_n(), output_dir: default_output_dir(), formats: default_formats() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Falls back to PAPERWATCH_LLM_API_KEY when unset or empty.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "bool_true")]
    pub summarize: bool,
}

fn default_llm_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_llm_model()    -> String { "gpt-3.5-turbo".to_string() }
fn bool_true()            -> bool   { true }

impl LlmConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
    }
}


impl Config {
    /// Load configuration from paperwatch.toml.
    /// Checks PAPERWATCH_CONFIG first, then the current directory. A missing
    /// file is not an error: defaults are used and a warning is logged.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "Config file not found, using defaults. Copy paperwatch.example.toml to paperwatch.toml to customise."
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
