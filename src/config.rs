//! Pipeline configuration.
//!
//! Handles loading, validating, and merging the configuration file. The
//! built-in defaults are a complete configuration on their own: running with
//! no config file converts `assets/images` into `public/images` with four
//! breakpoints. A config file only overrides what it names.
//!
//! ## Config File Location
//!
//! `--config <path>` on the command line, otherwise `folio-images.toml` in the
//! working directory when it exists.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! input_dir = "assets/images"    # Source tree, walked recursively
//! output_dir = "public/images"   # Derivatives + image-manifest.json
//!
//! [[breakpoints]]                # Label → target width, in output order
//! label = "small"
//! width = 400
//!
//! [[breakpoints]]
//! label = "medium"
//! width = 800
//!
//! [[breakpoints]]
//! label = "large"
//! width = 1200
//!
//! [[breakpoints]]
//! label = "extra-large"
//! width = 1600
//!
//! [quality]
//! avif = 80                      # Modern format, every derivative
//! jpeg = 85                      # Fallback for JPEG sources
//! png = 90                       # Fallback for PNG sources (lossless; picks compression effort)
//!
//! [processing]
//! max_processes = 4              # Max parallel encodes per image (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Tables merge key by key; arrays replace. Declaring any `[[breakpoints]]`
//! replaces the whole default breakpoint list:
//!
//! ```toml
//! [quality]
//! avif = 70
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Encoding, Quality};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "folio-images.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration.
///
/// All fields have defaults. Config files need only specify the values they
/// want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the source image tree.
    pub input_dir: PathBuf,
    /// Root of the derivative tree; the manifest is written here too.
    pub output_dir: PathBuf,
    /// Responsive breakpoints, in output order.
    pub breakpoints: Vec<Breakpoint>,
    /// Encoding quality per output encoding.
    pub quality: QualityConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("assets/images"),
            output_dir: PathBuf::from("public/images"),
            breakpoints: default_breakpoints(),
            quality: QualityConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

fn default_breakpoints() -> Vec<Breakpoint> {
    [
        ("small", 400),
        ("medium", 800),
        ("large", 1200),
        ("extra-large", 1600),
    ]
    .into_iter()
    .map(|(label, width)| Breakpoint {
        label: label.to_string(),
        width,
    })
    .collect()
}

/// Derivatives written under the input root would be picked up as sources
/// on the next run.
fn output_inside_input(input: &Path, output: &Path) -> bool {
    match (std::path::absolute(input), std::path::absolute(output)) {
        (Ok(input), Ok(output)) => output.starts_with(input),
        _ => false,
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("avif", self.quality.avif),
            ("jpeg", self.quality.jpeg),
            ("png", self.quality.png),
        ] {
            if value > 100 {
                return Err(ConfigError::Validation(format!(
                    "quality.{key} must be 0-100"
                )));
            }
        }

        let mut seen = HashSet::new();
        for bp in &self.breakpoints {
            if bp.label.is_empty() {
                return Err(ConfigError::Validation(
                    "breakpoint labels must not be empty".into(),
                ));
            }
            if bp.label.contains(['/', '\\', '.']) {
                return Err(ConfigError::Validation(format!(
                    "breakpoint label '{}' must not contain '/', '\\' or '.'",
                    bp.label
                )));
            }
            if bp.width == 0 {
                return Err(ConfigError::Validation(format!(
                    "breakpoint '{}' must have a non-zero width",
                    bp.label
                )));
            }
            if !seen.insert(bp.label.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate breakpoint label '{}'",
                    bp.label
                )));
            }
        }

        if output_inside_input(&self.input_dir, &self.output_dir) {
            return Err(ConfigError::Validation(format!(
                "output_dir {} must not be inside input_dir {}",
                self.output_dir.display(),
                self.input_dir.display()
            )));
        }
        Ok(())
    }

    /// Replace the input/output directories when given (CLI flags).
    pub fn with_dirs(mut self, input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        if let Some(input) = input {
            self.input_dir = input;
        }
        if let Some(output) = output {
            self.output_dir = output;
        }
        self
    }
}

/// A named target width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Breakpoint {
    /// Appears in derivative file names: `<stem>-<label>.<ext>`.
    pub label: String,
    /// Target width in pixels.
    pub width: u32,
}

/// Encoding quality (0 = worst, 100 = best) per output encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    pub avif: u32,
    pub jpeg: u32,
    pub png: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            avif: 80,
            jpeg: 85,
            png: 90,
        }
    }
}

impl QualityConfig {
    pub fn for_encoding(&self, encoding: Encoding) -> Quality {
        Quality::new(match encoding {
            Encoding::Avif => self.avif,
            Encoding::Jpeg => self.jpeg,
            Encoding::Png => self.png,
        })
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of concurrent derivative encodes.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values (including arrays) in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used when present, and the stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(load_raw_config(path)?),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Some(load_raw_config(default_path)?)
            } else {
                None
            }
        }
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# folio-images configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Source tree, walked recursively. Supported inputs:
# jpg, jpeg, png, gif, tiff, bmp (case-insensitive).
input_dir = "assets/images"

# Derivative tree. Mirrors the input tree's folders and receives
# image-manifest.json.
output_dir = "public/images"

# ---------------------------------------------------------------------------
# Breakpoints
# ---------------------------------------------------------------------------
# Each breakpoint produces <name>-<label>.avif (plus a .jpg or .png fallback
# for JPEG/PNG sources) when the source is at least `width` pixels wide.
# Declaring any breakpoint here replaces the whole list.

[[breakpoints]]
label = "small"
width = 400

[[breakpoints]]
label = "medium"
width = 800

[[breakpoints]]
label = "large"
width = 1200

[[breakpoints]]
label = "extra-large"
width = 1600

# ---------------------------------------------------------------------------
# Encoding quality (0 = worst, 100 = best)
# ---------------------------------------------------------------------------
[quality]
# Modern format, used for every sized derivative and the full-size copy.
avif = 80
# Fallback for JPEG sources.
jpeg = 85
# Fallback for PNG sources. PNG is lossless: 95+ encodes fastest,
# below 50 compresses hardest.
png = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum concurrent derivative encodes for one image.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
