use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::ensure;
use motion_preview::PreviewOptions;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const PROJECT_QUALIFIER: &str = "com";
const PROJECT_ORGANIZATION: &str = "GitHub";
const PROJECT_APPLICATION: &str = "motion_gen";

/// Environment variable that overrides the stored API key.
pub const API_KEY_VAR: &str = "API_KEY";

pub(crate) static PROJECT_DIRS: Lazy<Option<directories::ProjectDirs>> =
    Lazy::new(|| directories::ProjectDirs::from(PROJECT_QUALIFIER, PROJECT_ORGANIZATION, PROJECT_APPLICATION));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
    pub fps: u32,
    pub seconds: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
            pixel_ratio: 1.0,
            fps: 30,
            seconds: 3.0,
        }
    }
}

/// Largest logical width or height of a headless render.
pub const MAX_RENDER_SIZE: f64 = 4096.0;
pub const MAX_PIXEL_RATIO: f64 = 8.0;
pub const MAX_FPS: u32 = 120;
pub const MAX_SECONDS: f64 = 600.0;

impl RenderSettings {
    /// Number of frames rendered for an export. Only meaningful for settings
    /// that passed [`RenderSettings::validate`].
    pub fn frame_count(&self) -> usize {
        (self.seconds.max(0.0) * f64::from(self.fps.max(1))).round() as usize
    }

    /// Rejects sizes and durations a headless render can't handle.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            ensure!(
                value.is_finite() && value > 0.0 && value <= MAX_RENDER_SIZE,
                "{name} must be between 0 and {MAX_RENDER_SIZE}, got {value}"
            );
        }
        ensure!(
            self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0 && self.pixel_ratio <= MAX_PIXEL_RATIO,
            "pixel ratio must be between 0 and {MAX_PIXEL_RATIO}, got {}",
            self.pixel_ratio
        );
        ensure!((1..=MAX_FPS).contains(&self.fps), "fps must be between 1 and {MAX_FPS}, got {}", self.fps);
        ensure!(
            self.seconds.is_finite() && self.seconds > 0.0 && self.seconds <= MAX_SECONDS,
            "seconds must be between 0 and {MAX_SECONDS}, got {}",
            self.seconds
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generator: GeneratorSettings,
    pub preview: PreviewOptions,
    pub render: RenderSettings,
}

impl Settings {
    const FILE_NAME: &'static str = "settings.toml";

    pub fn config_dir() -> Option<PathBuf> {
        PROJECT_DIRS.as_ref().map(|p| p.config_dir().to_path_buf())
    }

    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join(Self::FILE_NAME))
    }

    pub fn log_dir() -> Option<PathBuf> {
        let dir = Self::config_dir()?;
        if !dir.exists() && fs::create_dir_all(&dir).is_err() {
            return None;
        }
        Some(dir)
    }

    /// Loads the settings file, falling back to defaults if it is missing or broken.
    pub fn load() -> Self {
        let mut settings = Self::config_file().map(|path| Self::load_from(&path)).unwrap_or_default();
        settings.apply_env(std::env::var(API_KEY_VAR).ok());
        settings
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(txt) => match toml::from_str::<Settings>(&txt) {
                Ok(settings) => return settings,
                Err(err) => log::error!("Error parsing settings file {}: {}", path.display(), err),
            },
            Err(err) => log::error!("Error reading settings file: {}", err),
        }
        Self::default()
    }

    /// A non-empty key from the environment wins over the stored one.
    pub fn apply_env(&mut self, env_key: Option<String>) {
        if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
            self.generator.api_key = Some(key);
        }
    }

    /// Writes the settings atomically: temp file first, then rename.
    pub fn store_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let text = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

        let write_result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
            Ok(())
        })();
        if let Err(err) = write_result {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        if let Err(err) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = toml::from_str("[render]\nfps = 12\n").unwrap();
        assert_eq!(settings.render.fps, 12);
        assert_eq!(settings.render.width, 400.0);
        assert_eq!(settings.generator.model, "gemini-2.5-flash");
        assert_eq!(settings.preview, PreviewOptions::default());
    }

    #[test]
    fn test_env_key_overrides_stored_key() {
        let mut settings = Settings::default();
        settings.generator.api_key = Some("stored".to_string());
        settings.apply_env(Some("  ".to_string()));
        assert_eq!(settings.generator.api_key.as_deref(), Some("stored"));
        settings.apply_env(Some("from-env".to_string()));
        assert_eq!(settings.generator.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_frame_count() {
        let render = RenderSettings {
            fps: 24,
            seconds: 2.5,
            ..Default::default()
        };
        assert_eq!(render.frame_count(), 60);
    }

    #[test]
    fn test_render_settings_validation() {
        assert!(RenderSettings::default().validate().is_ok());

        let invalid = [
            RenderSettings { seconds: 1e300, ..Default::default() },
            RenderSettings { seconds: f64::NAN, ..Default::default() },
            RenderSettings { seconds: 0.0, ..Default::default() },
            RenderSettings { fps: 0, ..Default::default() },
            RenderSettings { fps: 100_000, ..Default::default() },
            RenderSettings { width: f64::INFINITY, ..Default::default() },
            RenderSettings { height: -1.0, ..Default::default() },
            RenderSettings { width: 1e9, ..Default::default() },
            RenderSettings { pixel_ratio: f64::NAN, ..Default::default() },
            RenderSettings { pixel_ratio: 100.0, ..Default::default() },
        ];
        for settings in invalid {
            assert!(settings.validate().is_err(), "{settings:?}");
        }

        let err = RenderSettings { seconds: 1e300, ..Default::default() }.validate().unwrap_err();
        assert!(err.to_string().contains("seconds"), "{err}");
    }
}
