//! User defaults loaded from a TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_error, CoreError, CoreResult};
use crate::fs::walk::WalkOptions;

/// Top-level configuration.
///
/// All fields have defaults so the tools work without a config file.
/// Call [`Config::load`] to read from a TOML path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub walk: WalkConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(io_error(path))?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> CoreResult<Self> {
        match Self::load(path) {
            Err(CoreError::NotFound(_)) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Walk options seeded from the `[walk]` section.
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            follow_symlinks: self.walk.follow_symlinks,
            abort_on_error: self.walk.abort_on_error,
            ..Default::default()
        }
    }
}

/// Defaults for line-oriented commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextConfig {
    /// Line count for `head`/`tail` when none is given.
    #[serde(default = "default_lines")]
    pub default_lines: usize,
    /// Context lines around each unified diff hunk.
    #[serde(default = "default_diff_context")]
    pub diff_context: usize,
    #[serde(default = "default_cut_delimiter")]
    pub cut_delimiter: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            default_lines: default_lines(),
            diff_context: default_diff_context(),
            cut_delimiter: default_cut_delimiter(),
        }
    }
}

/// Traversal defaults for `ls`, `find`, `du` and recursive operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkConfig {
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default)]
    pub abort_on_error: bool,
}

/// Presentation preferences for the command-line front end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print sizes as `1.5K`, `3.0M`, ...
    #[serde(default)]
    pub human_readable: bool,
}

fn default_lines() -> usize {
    10
}

fn default_diff_context() -> usize {
    3
}

fn default_cut_delimiter() -> String {
    "\t".to_string()
}
