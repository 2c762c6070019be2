use crate::models::PageMode;
use crate::store::Theme;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Configuration {
    pub dataset: Option<DatasetConfig>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<usize>,
    #[serde(rename = "paginationMode")]
    pub pagination_mode: Option<String>,
    #[serde(rename = "debounceMs")]
    pub debounce_ms: Option<u64>,
    #[serde(rename = "dataDir")]
    pub data_dir: Option<String>,
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatasetConfig {
    pub url: Option<String>,
    pub path: Option<String>,
}

impl Configuration {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Configuration = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Loads the file when present; a missing file means built-in defaults
    /// so every subcommand works on a bare checkout.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(path).exists() {
            let config = Self::from_file(path)?;
            info!("Configuration loaded from: {}", path);
            Ok(config)
        } else {
            info!("No configuration file at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(36).max(1)
    }

    pub fn pagination_mode(&self) -> PageMode {
        self.pagination_mode
            .as_deref()
            .and_then(PageMode::parse)
            .unwrap_or(PageMode::Windowed)
    }

    /// Idle delay before a query edit reaches the pipeline.
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(150))
    }

    pub fn storage_path(&self) -> PathBuf {
        let dir = self.data_dir.as_deref().unwrap_or(".");
        PathBuf::from(dir).join("catalogarr_store.json")
    }

    pub fn default_theme(&self) -> Theme {
        self.theme
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or(Theme::Dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_sections_are_absent() {
        let config = Configuration::default();
        assert_eq!(config.page_size(), 36);
        assert_eq!(config.pagination_mode(), PageMode::Windowed);
        assert_eq!(config.debounce_delay(), Duration::from_millis(150));
        assert_eq!(config.default_theme(), Theme::Dark);
        assert_eq!(
            config.storage_path(),
            PathBuf::from("./catalogarr_store.json")
        );
    }

    #[test]
    fn yaml_fields_use_camel_case() {
        let config: Configuration = serde_yaml::from_str(
            "dataset:\n  path: movies.json\npageSize: 12\npaginationMode: loadmore\ndebounceMs: 300\ndataDir: /tmp/catalogarr\ntheme: light\n",
        )
        .unwrap();
        assert_eq!(config.page_size(), 12);
        assert_eq!(config.pagination_mode(), PageMode::LoadMore);
        assert_eq!(config.debounce_delay(), Duration::from_millis(300));
        assert_eq!(config.default_theme(), Theme::Light);
        assert_eq!(
            config.dataset.as_ref().and_then(|d| d.path.as_deref()),
            Some("movies.json")
        );
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/tmp/catalogarr/catalogarr_store.json")
        );
    }

    #[test]
    fn zero_page_size_is_raised_to_one() {
        let config = Configuration {
            page_size: Some(0),
            ..Configuration::default()
        };
        assert_eq!(config.page_size(), 1);
    }
}
