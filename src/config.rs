//! Configuration file handling.
//!
//! Settings come from `.vgsales.toml` (or `--config`), then CLI flags
//! override them. Custom views are declared as `[[views]]` tables.

use crate::cli::{check_delimiter, Args, OutputFormat};
use crate::error::Result;
use crate::views::View;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = ".vgsales.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Extra views, or replacements for built-in ones of the same name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<View>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    #[serde(default)]
    pub format: OutputFormat,

    /// Views to run; empty means all.
    #[serde(default)]
    pub views: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            delimiter: default_delimiter(),
            preview_rows: default_preview_rows(),
            format: OutputFormat::default(),
            views: Vec::new(),
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("videogames_wide.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_delimiter() -> char {
    ','
}

fn default_preview_rows() -> usize {
    3
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Returns `Ok(None)` if the default file doesn't exist, `Err` if it
    /// exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref input) = args.input {
            self.general.input = input.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }
        if let Some(d) = args.delimiter {
            self.general.delimiter = d;
        }
        if let Some(n) = args.preview_rows {
            self.general.preview_rows = n;
        }
        if let Some(f) = args.format {
            self.general.format = f;
        }
        if !args.views.is_empty() {
            self.general.views = args.views.clone();
        }
    }

    /// Check settings after merging, so values from the file get the same
    /// checks as their CLI flags.
    pub fn validate(&self) -> std::result::Result<(), String> {
        check_delimiter(self.general.delimiter)?;
        if self.general.preview_rows == 0 {
            return Err("preview_rows must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}
