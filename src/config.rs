use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::graph::GraphSettings;

/// Environment variable that overrides `graph.max_graph_nodes`.
pub const MAX_GRAPH_NODES_ENV: &str = "MAX_GRAPH_NODES";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kgquery: KgqueryConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// kgquery-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KgqueryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Logger filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for KgqueryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
        }
    }
}

/// Subgraph extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Node budget for a single query result
    #[serde(default = "default_max_graph_nodes")]
    pub max_graph_nodes: usize,
    /// Safety valve on visited nodes; 0 means ten times the node budget
    #[serde(default)]
    pub max_visited_nodes: usize,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
    #[serde(default = "default_max_depth")]
    pub default_max_depth: i64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_graph_nodes: default_max_graph_nodes(),
            max_visited_nodes: 0,
            case_sensitive: default_case_sensitive(),
            default_max_depth: default_max_depth(),
        }
    }
}

/// Performance tuning configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceConfig {
    /// Per-query deadline; 0 disables it
    #[serde(default)]
    pub max_latency_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("kgquery.db")
}

fn default_max_graph_nodes() -> usize {
    1000
}

fn default_case_sensitive() -> bool {
    true
}

fn default_max_depth() -> i64 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KGQUERY_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let config_path = Self::locate();

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml_str(&config_str)
    }

    /// Like [`Config::load`], but a missing config file yields the built-in
    /// defaults (environment overrides still apply). A file that exists but
    /// does not parse or validate is still an error.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::locate();
        if config_path.exists() {
            Self::load()
        } else {
            Self::from_env_defaults()
        }
    }

    /// Built-in defaults with environment overrides applied, then validated
    pub fn from_env_defaults() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` (optional) and resolve the config file path
    fn locate() -> PathBuf {
        let _ = dotenv::dotenv();

        std::env::var("KGQUERY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// Parse, apply environment overrides, and validate
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(config_str)
            .context("Failed to parse config.toml")?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var(MAX_GRAPH_NODES_ENV) {
            self.graph.max_graph_nodes = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer, got {:?}", MAX_GRAPH_NODES_ENV, raw))?;
        }
        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.graph.max_graph_nodes == 0 {
            anyhow::bail!("graph.max_graph_nodes must be greater than 0");
        }

        if self.graph.max_visited_nodes != 0
            && self.graph.max_visited_nodes < self.graph.max_graph_nodes
        {
            anyhow::bail!(
                "graph.max_visited_nodes ({}) must be at least graph.max_graph_nodes ({})",
                self.graph.max_visited_nodes,
                self.graph.max_graph_nodes
            );
        }

        if self.graph.default_max_depth < 0 {
            anyhow::bail!("graph.default_max_depth must not be negative");
        }

        Ok(())
    }

    /// Default `env_logger` filter
    pub fn log_level(&self) -> &str {
        &self.kgquery.log_level
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.kgquery.db_path
    }

    /// Extraction settings handed to the query service
    pub fn graph_settings(&self) -> GraphSettings {
        let max_visited_nodes = if self.graph.max_visited_nodes == 0 {
            self.graph.max_graph_nodes.saturating_mul(10)
        } else {
            self.graph.max_visited_nodes
        };

        GraphSettings {
            node_budget: self.graph.max_graph_nodes,
            max_visited_nodes,
            case_sensitive: self.graph.case_sensitive,
            max_latency_ms: match self.performance.max_latency_ms {
                0 => None,
                ms => Some(ms),
            },
        }
    }
}
