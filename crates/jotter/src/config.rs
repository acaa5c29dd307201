use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::keymap::Action;
use crate::zoom::{DEFAULT_FONT_SIZE, MIN_FONT_SIZE};

const MAX_INITIAL_FONT_SIZE: u16 = 96;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub font: FontConfig,
    pub editor: EditorConfig,
    pub paths: PathsConfig,
    /// Chord overrides per action, e.g. `"save-as": ["ctrl+shift+s"]`.
    pub keybindings: BTreeMap<Action, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: u16,
    pub family: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_FONT_SIZE,
            family: String::from("monospace"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub tab_size: usize,
    pub use_spaces: bool,
    pub line_numbers: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_size: 4,
            use_spaces: false,
            line_numbers: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub recovery_file: Option<PathBuf>,
    pub session_file: Option<PathBuf>,
}

impl Config {
    /// Load from the platform config directory, writing defaults on first run.
    pub async fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path).await,
            None => {
                log::warn!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub async fn load_from(config_path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(config_path).await? {
            log::info!("Config file does not exist, creating default");
            let default_config = Self::default();
            if let Err(e) = default_config.save_to(config_path).await {
                log::warn!("Could not write default config: {}", e);
            }
            return Ok(default_config);
        }

        let content = match tokio::fs::read_to_string(config_path).await {
            Ok(content) => content,
            Err(e) => {
                log::error!("Failed to read config file: {}", e);
                return Ok(Self::default());
            }
        };

        if content.trim().is_empty() {
            log::warn!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        match serde_json::from_str::<Self>(&content) {
            Ok(mut config) => {
                config.validate();
                log::info!("Loaded config from: {}", config_path.display());
                Ok(config)
            }
            Err(json_err) => {
                log::error!("Failed to parse config file: {}", json_err);

                let backup_path = config_path.with_extension("bak");
                match tokio::fs::copy(config_path, &backup_path).await {
                    Ok(_) => log::info!("Backed up broken config to: {}", backup_path.display()),
                    Err(e) => log::warn!("Failed to backup broken config: {}", e),
                }
                Ok(Self::default())
            }
        }
    }

    pub async fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                )
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(config_path, content).await.map_err(|e| {
            anyhow::anyhow!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            )
        })?;
        log::info!("Saved config to: {}", config_path.display());
        Ok(())
    }

    /// Correct out-of-range values in place.
    pub fn validate(&mut self) {
        let mut has_issues = false;

        if !(MIN_FONT_SIZE..=MAX_INITIAL_FONT_SIZE).contains(&self.font.size) {
            log::warn!("Invalid font size: {}, using default", self.font.size);
            self.font.size = DEFAULT_FONT_SIZE;
            has_issues = true;
        }

        if self.editor.tab_size == 0 || self.editor.tab_size > 16 {
            log::warn!("Invalid tab size: {}, using default", self.editor.tab_size);
            self.editor.tab_size = 4;
            has_issues = true;
        }

        if self.font.family.trim().is_empty() {
            self.font.family = String::from("monospace");
            has_issues = true;
        }

        if has_issues {
            log::info!("Configuration validation completed with corrections");
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "jotter", "jotter")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.font.size, 12);
        assert_eq!(config.font.family, "monospace");
        assert_eq!(config.editor.tab_size, 4);
        assert!(!config.editor.use_spaces);
        assert!(config.paths.recovery_file.is_none());
        assert!(config.keybindings.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config
            .keybindings
            .insert(Action::SaveAs, vec!["ctrl+shift+s".to_string()]);

        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"font\""));
        assert!(json.contains("\"save-as\""));

        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.font.size, config.font.size);
        assert_eq!(
            parsed.keybindings.get(&Action::SaveAs),
            Some(&vec!["ctrl+shift+s".to_string()])
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = serde_json::from_str(r#"{"font": {"size": 20}}"#).unwrap();
        assert_eq!(parsed.font.size, 20);
        assert_eq!(parsed.font.family, "monospace");
        assert_eq!(parsed.editor.tab_size, 4);
    }

    #[test]
    fn test_validate_corrects_values() {
        let mut config = Config::default();
        config.font.size = 2;
        config.editor.tab_size = 0;
        config.validate();
        assert_eq!(config.font.size, DEFAULT_FONT_SIZE);
        assert_eq!(config.editor.tab_size, 4);
    }

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jotter").join("config.json");

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config.font.size, DEFAULT_FONT_SIZE);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_broken_config_backs_up_and_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ broken").unwrap();

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config.editor.tab_size, 4);
        assert!(dir.path().join("config.bak").exists());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.font.size = 18;
        config.save_to(&path).await.unwrap();

        let loaded = Config::load_from(&path).await.unwrap();
        assert_eq!(loaded.font.size, 18);
    }
}
