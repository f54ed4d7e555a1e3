use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::schedule::ValidationMode;
use crate::utils::time::NextPrayerFallback;

fn default_admin_name() -> String {
    "admin".to_string()
}
fn default_hijri_offset() -> i32 {
    0
}
fn default_browse_limit() -> u32 {
    20
}
fn default_nearby_radius_km() -> f64 {
    10.0
}

/// The administrator acting from this terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_name")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Mosque used by schedule and announcement commands when `--mosque`
    /// is not given.
    #[serde(default)]
    pub mosque_id: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: default_admin_name(),
            email: None,
            mosque_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Reject blank or malformed times on save.
    #[serde(default)]
    pub strict_times: bool,
    #[serde(default)]
    pub next_prayer_fallback: NextPrayerFallback,
    /// Days to add/subtract from Hijri date for local moon sighting.
    #[serde(default = "default_hijri_offset")]
    pub hijri_offset: i32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            strict_times: false,
            next_prayer_fallback: NextPrayerFallback::default(),
            hijri_offset: default_hijri_offset(),
        }
    }
}

impl ScheduleConfig {
    pub fn validation_mode(&self) -> ValidationMode {
        if self.strict_times {
            ValidationMode::Strict
        } else {
            ValidationMode::Permissive
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// How many mosques a blank search lists.
    #[serde(default = "default_browse_limit")]
    pub default_limit: u32,
    #[serde(default = "default_nearby_radius_km")]
    pub nearby_radius_km: f64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_browse_limit(),
            nearby_radius_km: default_nearby_radius_km(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "masjid")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("masjid.db"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.admin.name, "admin");
        assert!(!config.schedule.strict_times);
        assert_eq!(config.schedule.validation_mode(), ValidationMode::Permissive);
        assert_eq!(config.directory.default_limit, 20);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[schedule]\nstrict_times = true\nnext_prayer_fallback = \"none\"\n",
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.schedule.validation_mode(), ValidationMode::Strict);
        assert_eq!(config.schedule.next_prayer_fallback, NextPrayerFallback::None);
        assert_eq!(config.directory.nearby_radius_km, 10.0);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.admin.mosque_id = Some("m1".into());
        config.schedule.hijri_offset = -1;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.admin.mosque_id.as_deref(), Some("m1"));
        assert_eq!(loaded.schedule.hijri_offset, -1);
    }
}
