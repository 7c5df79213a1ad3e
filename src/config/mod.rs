use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::catalog::PresetKey;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Rangepick";
const APP_NAME: &str = "rangepick";

pub const CONFIG_ENV: &str = "RANGEPICK_CONFIG";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        Ok(Self {
            config_dir,
            config_file,
        })
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_dir: dir.to_path_buf(),
            config_file: dir.join("config.toml"),
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir).with_context(|| {
            format!(
                "creating application directory {}",
                self.config_dir.display()
            )
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub picker: PickerConfig,
    pub calendar: CalendarOptions,
}

impl AppConfig {
    fn post_load(&mut self) {
        if self.calendar.min_year > self.calendar.max_year {
            tracing::warn!(
                min_year = self.calendar.min_year,
                max_year = self.calendar.max_year,
                "calendar year bounds inverted, swapping"
            );
            std::mem::swap(&mut self.calendar.min_year, &mut self.calendar.max_year);
        }
    }
}

/// Host-facing picker options. `initial_key` is kept raw so that unknown
/// names reach the picker and fall back there.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub initial_key: String,
    pub apply_button_style: String,
    pub container_style: String,
    pub reset_pending_on_cancel: bool,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            initial_key: PresetKey::DEFAULT.as_str().to_string(),
            apply_button_style: "primary".to_string(),
            container_style: String::new(),
            reset_pending_on_cancel: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarOptions {
    pub week_starts_on: WeekStart,
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            week_starts_on: WeekStart::Monday,
            min_year: 1900,
            max_year: 2100,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WeekStart {
    Monday,
    Sunday,
}

impl Default for WeekStart {
    fn default() -> Self {
        WeekStart::Monday
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult<T = ()> = Result<T>;

    #[test]
    fn first_run_writes_defaults() -> TestResult {
        let dir = TempDir::new()?;
        let loader = ConfigLoader::with_paths(ConfigPaths::in_dir(&dir.path().join("cfg")));
        let cfg = loader.load_or_init()?;
        assert_eq!(cfg.picker.initial_key, "Last28Days");
        assert_eq!(cfg.picker.apply_button_style, "primary");
        assert!(loader.paths().config_file.exists());

        let reloaded = loader.load()?;
        assert_eq!(reloaded.calendar.week_starts_on, WeekStart::Monday);
        Ok(())
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> TestResult {
        let dir = TempDir::new()?;
        let paths = ConfigPaths::in_dir(dir.path());
        fs::write(
            &paths.config_file,
            "[picker]\ninitial_key = \"ThisMonth\"\n\n[calendar]\nweek_starts_on = \"sunday\"\n",
        )?;
        let cfg = ConfigLoader::with_paths(paths).load_or_init()?;
        assert_eq!(cfg.picker.initial_key, "ThisMonth");
        assert_eq!(cfg.picker.container_style, "");
        assert!(!cfg.picker.reset_pending_on_cancel);
        assert_eq!(cfg.calendar.week_starts_on, WeekStart::Sunday);
        assert_eq!(cfg.calendar.max_year, 2100);
        Ok(())
    }

    #[test]
    fn inverted_year_bounds_are_swapped() -> TestResult {
        let dir = TempDir::new()?;
        let paths = ConfigPaths::in_dir(dir.path());
        fs::write(&paths.config_file, "[calendar]\nmin_year = 2050\nmax_year = 2000\n")?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.calendar.min_year, 2000);
        assert_eq!(cfg.calendar.max_year, 2050);
        Ok(())
    }

    #[test]
    fn malformed_toml_is_reported() -> TestResult {
        let dir = TempDir::new()?;
        let paths = ConfigPaths::in_dir(dir.path());
        fs::write(&paths.config_file, "[picker\n")?;
        let err = ConfigLoader::with_paths(paths)
            .load()
            .expect_err("invalid toml");
        assert!(err.to_string().contains("parsing config toml"));
        Ok(())
    }
}
