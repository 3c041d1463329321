use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

pub const CURRENT_CONFIG_VERSION: &str = "v1";

const DEFAULT_MAX_IMAGE_KB: u64 = 2048;

fn default_config_version() -> String {
    CURRENT_CONFIG_VERSION.to_string()
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_public_url_prefix() -> String {
    "/storage".to_string()
}

fn default_max_image_kb() -> u64 {
    DEFAULT_MAX_IMAGE_KB
}

/// Where uploaded images land on the public disk and how they are addressed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory under the public disk that holds variant images.
    #[serde(alias = "imagesDir")]
    pub images_dir: String,
    /// Prefix that maps public-disk paths to URLs, e.g. `/storage` or a CDN origin.
    #[serde(alias = "publicUrlPrefix")]
    pub public_url_prefix: String,
    #[serde(alias = "maxImageKb")]
    pub max_image_kb: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            public_url_prefix: default_public_url_prefix(),
            max_image_kb: default_max_image_kb(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: String,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    pub fn from_raw(raw_config: &str) -> Self {
        match serde_json::from_str::<Config>(raw_config) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config (line {}, column {}): {}, using default",
                    e.line(),
                    e.column(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.config_version = CURRENT_CONFIG_VERSION.to_string();

        let images_dir = self.storage.images_dir.trim().trim_matches('/').to_string();
        if !is_relative_subdir(&images_dir) {
            tracing::warn!(
                "Invalid images directory '{}', resetting to default",
                self.storage.images_dir
            );
            self.storage.images_dir = default_images_dir();
        } else {
            self.storage.images_dir = images_dir;
        }

        let prefix = self.storage.public_url_prefix.trim().trim_end_matches('/');
        if prefix.is_empty() {
            tracing::warn!("Empty public URL prefix, resetting to default");
            self.storage.public_url_prefix = default_public_url_prefix();
        } else {
            self.storage.public_url_prefix = prefix.to_string();
        }

        if self.storage.max_image_kb == 0 {
            tracing::warn!("Image size limit of 0 KB, resetting to default");
            self.storage.max_image_kb = default_max_image_kb();
        }

        self
    }
}

fn is_relative_subdir(dir: &str) -> bool {
    !dir.is_empty()
        && Path::new(dir)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_falls_back_to_defaults() {
        assert_eq!(Config::from_raw("{not json"), Config::default());
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config = Config::from_raw(r#"{"storage":{"maxImageKb":100}}"#);
        assert_eq!(config.storage.max_image_kb, 100);
        assert_eq!(config.storage.images_dir, "images");
        assert_eq!(config.storage.public_url_prefix, "/storage");
    }

    #[test]
    fn normalization_rejects_unsafe_values() {
        let config = Config::from_raw(
            r#"{"config_version":"v0","storage":{"images_dir":"../etc","public_url_prefix":"  ","max_image_kb":0}}"#,
        );
        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn normalization_trims_separators() {
        let config = Config::from_raw(
            r#"{"storage":{"images_dir":"/media/variants/","public_url_prefix":"https://cdn.example.com/"}}"#,
        );
        assert_eq!(config.storage.images_dir, "media/variants");
        assert_eq!(config.storage.public_url_prefix, "https://cdn.example.com");
    }
}
