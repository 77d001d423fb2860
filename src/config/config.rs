use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::app_paths::AppPaths;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pagination: PaginationConfig,
    pub sorting: SortingConfig,
    pub visibility: VisibilityConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Rows per page when no preference is stored
    pub default_per_page: usize,

    /// Choices offered by the page-size selector
    pub page_size_options: Vec<usize>,

    /// Page buttons shown before the row collapses with ellipses
    pub max_page_buttons: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortingConfig {
    /// Leading rows inspected when autodetecting a column type
    pub sample_size: usize,

    /// Share of the sample that must parse as time/date
    pub detection_threshold: f64,

    /// Sort by the first column when a table is bound
    pub sort_on_load: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Minimum distance between the column menu and the viewport edges
    pub menu_margin: f64,

    /// Space between the toggle button and the menu
    pub menu_gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Preferences file; defaults to the user data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    pub filter: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: 25,
            page_size_options: vec![10, 25, 50, 100],
            max_page_buttons: 7,
        }
    }
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self {
            sample_size: crate::data::type_inference::DEFAULT_SAMPLE_SIZE,
            detection_threshold: crate::data::type_inference::DEFAULT_THRESHOLD,
            sort_on_load: true,
        }
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            menu_margin: 8.0,
            menu_gap: 4.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, creating it when missing
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(AppPaths::config_dir()?.join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.pagination.default_per_page == 0 {
            bail!("pagination.default_per_page must be at least 1");
        }
        if self.pagination.page_size_options.iter().any(|&n| n == 0) {
            bail!("pagination.page_size_options must not contain 0");
        }
        if !(0.0..1.0).contains(&self.sorting.detection_threshold) {
            bail!("sorting.detection_threshold must be in [0, 1)");
        }
        Ok(())
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# table-views configuration file
# Location: ~/.config/table-views/config.toml (Linux)
#           ~/Library/Application Support/table-views/config.toml (macOS)
#           %APPDATA%\table-views\config.toml (Windows)

[pagination]
# Rows per page when no page-size preference has been saved yet
default_per_page = 25

# Choices offered by the page-size selector
page_size_options = [10, 25, 50, 100]

# Page buttons shown before the page row collapses with ellipses
max_page_buttons = 7

[sorting]
# Leading rows inspected when autodetecting a column type
sample_size = 10

# Share of sampled values that must parse as time/date for the column to use that type
detection_threshold = 0.7

# Sort every sortable table by its first column when it is bound
sort_on_load = true

[visibility]
# Minimum distance (px) between the column menu and the viewport edges
menu_margin = 8.0

# Space (px) between the toggle button and the menu
menu_gap = 4.0

[storage]
# Preferences file (leave commented to use the user data directory)
# preferences_file = "/path/to/preferences.json"

[logging]
# Log filter used when RUST_LOG is not set
filter = "info"
"#
        .to_string()
    }
}
