use config::{Config as ConfigBuilder, File};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{DetabError, DetabResult};
use crate::pipeline::default_worker_count;
use crate::tabconv::TabConverters;

/// Configuration for one rewrite run.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations, later ones taking
/// precedence:
/// 1. Global `$CONFIG_DIR/detab/config.yaml`
/// 2. Local `.detab.yaml` in the current directory
/// 3. Custom config file specified via `--config`
///
/// # Configuration Format
///
/// ```yaml
/// # Regular expression matched against file names
/// filter: "\\.(c|h)$"
///
/// # Directory to start from
/// root_path: "src"
///
/// # Tab width in spaces (0 deletes tabs)
/// tab_width: 4
///
/// # Worker threads (default: logical CPUs - 1)
/// worker_count: 3
///
/// # Compute changes without writing them
/// dry_run: false
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Regular expression matched against each file name
    pub filter: String,

    /// Root directory to start scanning from
    pub root_path: PathBuf,

    /// Tab width in spaces; `validate` accepts 0 through 127
    pub tab_width: i64,

    /// Number of worker threads rewriting files
    pub worker_count: NonZeroUsize,

    /// Whether to only report what would change
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub filter: Option<String>,
    pub root_path: Option<PathBuf>,
    pub tab_width: Option<i64>,
    pub worker_count: Option<NonZeroUsize>,
    pub dry_run: bool,
    pub log_level: Option<String>,
}

/// A configuration that passed validation, with the filter and converters built
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub root_path: PathBuf,
    pub filter: Regex,
    pub converters: TabConverters,
    pub worker_count: NonZeroUsize,
    pub dry_run: bool,
}

pub const DEFAULT_FILTER: &str = ".*";
pub const DEFAULT_TAB_WIDTH: i64 = 4;

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            root_path: PathBuf::from("."),
            tab_width: DEFAULT_TAB_WIDTH,
            worker_count: default_worker_count(),
            dry_run: false,
            log_level: default_log_level(),
        }
    }
}

impl PipelineConfig {
    pub fn new(root_path: impl Into<PathBuf>, filter: impl Into<String>, tab_width: i64) -> Self {
        Self {
            root_path: root_path.into(),
            filter: filter.into(),
            tab_width,
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> DetabResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("detab/config.yaml")),
            Some(PathBuf::from(".detab.yaml")),
        ];
        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges command-line values over the loaded configuration
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if let Some(filter) = cli.filter {
            self.filter = filter;
        }
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if let Some(tab_width) = cli.tab_width {
            self.tab_width = tab_width;
        }
        if let Some(worker_count) = cli.worker_count {
            self.worker_count = worker_count;
        }
        if cli.dry_run {
            self.dry_run = true;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// Checks the filter and tab width and builds what the run needs.
    ///
    /// Nothing is scanned or spawned here, so invalid input never reaches the
    /// pipeline.
    pub fn validate(&self) -> DetabResult<RunPlan> {
        let filter = Regex::new(&self.filter).map_err(|e| {
            DetabError::invalid_pattern(format!("filter '{}': {}", self.filter, e))
        })?;
        let converters = TabConverters::new(self.tab_width)?;

        Ok(RunPlan {
            root_path: self.root_path.clone(),
            filter,
            converters,
            worker_count: self.worker_count,
            dry_run: self.dry_run,
        })
    }
}
