use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::view::{ColorOptions, ReprOptions, SortField, SortOrder};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DelimiterConfig {
    pub delimiter_string: String,
    pub enable_delimiter: bool,
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        let repr = ReprOptions::default();
        Self {
            delimiter_string: repr.delimiter_string,
            enable_delimiter: repr.enable_delimiter,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SortingConfig {
    pub default_sort_field: SortField,
    pub default_sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FoldingConfig {
    pub unpinned_item_folding_threshold: usize,
    pub default_folding: bool,
}

impl Default for FoldingConfig {
    fn default() -> Self {
        let repr = ReprOptions::default();
        Self {
            unpinned_item_folding_threshold: repr.unpin_fold_threshold,
            default_folding: repr.is_folded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    pub show_filename_in_item_description: bool,
    pub show_position_in_item_description: bool,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            show_filename_in_item_description: true,
            show_position_in_item_description: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub enable_colorizing: bool,
    pub warm_color_threshold: u32,
    pub hot_color_threshold: u32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        let colors = ColorOptions::default();
        Self {
            enable_colorizing: colors.colorize,
            warm_color_threshold: colors.warm_color_threshold,
            hot_color_threshold: colors.hot_color_threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Presentation settings read from `~/.arrival/config.toml`. Every key is
/// optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub delimiter: DelimiterConfig,
    pub sorting: SortingConfig,
    pub folding: FoldingConfig,
    pub item: ItemConfig,
    pub color: ColorConfig,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".arrival").join("config.toml"))
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config at {}", path.display()))
    }

    /// Load from `path` if given, otherwise from the default location.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse TOML")
    }

    pub fn repr_options(&self) -> ReprOptions {
        ReprOptions {
            delimiter_string: self.delimiter.delimiter_string.clone(),
            enable_delimiter: self.delimiter.enable_delimiter,
            sort_field: self.sorting.default_sort_field,
            sort_order: self.sorting.default_sort_order,
            unpin_fold_threshold: self.folding.unpinned_item_folding_threshold,
            is_folded: self.folding.default_folding,
            show_filename: self.item.show_filename_in_item_description,
            show_position: self.item.show_position_in_item_description,
        }
    }

    pub fn color_options(&self) -> ColorOptions {
        ColorOptions {
            colorize: self.color.enable_colorizing,
            warm_color_threshold: self.color.warm_color_threshold,
            hot_color_threshold: self.color.hot_color_threshold,
        }
    }
}
