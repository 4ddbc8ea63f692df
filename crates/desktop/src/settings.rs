use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use facemark_core::annotation::domain::box_scaler;
use facemark_core::detection::domain::face_detector::DetectionOptions;
use facemark_core::shared::constants::DEFAULT_TIME_UPDATE_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMode {
    Unscaled,
    Proportional,
}

impl ScalingMode {
    pub const ALL: &[ScalingMode] = &[ScalingMode::Proportional, ScalingMode::Unscaled];
}

impl std::fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalingMode::Unscaled => write!(f, "Native pixels"),
            ScalingMode::Proportional => write!(f, "Fit to video"),
        }
    }
}

impl From<ScalingMode> for box_scaler::ScalingMode {
    fn from(mode: ScalingMode) -> Self {
        match mode {
            ScalingMode::Unscaled => box_scaler::ScalingMode::Unscaled,
            ScalingMode::Proportional => box_scaler::ScalingMode::Proportional,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayBackend {
    Raster,
    Shapes,
}

impl OverlayBackend {
    pub const ALL: &[OverlayBackend] = &[OverlayBackend::Raster, OverlayBackend::Shapes];
}

impl std::fmt::Display for OverlayBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayBackend::Raster => write!(f, "Bitmap"),
            OverlayBackend::Shapes => write!(f, "Vector"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    System,
    Dark,
    Light,
}

impl Appearance {
    pub const ALL: &[Appearance] = &[Appearance::System, Appearance::Dark, Appearance::Light];
}

impl std::fmt::Display for Appearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Appearance::System => write!(f, "System"),
            Appearance::Dark => write!(f, "Dark"),
            Appearance::Light => write!(f, "Light"),
        }
    }
}

pub const TIME_UPDATE_MIN_MS: u64 = 50;
pub const TIME_UPDATE_MAX_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scaling_mode: ScalingMode,
    pub overlay_backend: OverlayBackend,
    pub confidence: u32,
    pub time_update_ms: u64,
    pub with_landmarks: bool,
    pub with_descriptors: bool,
    pub appearance: Appearance,
    pub high_contrast: bool,
    pub font_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scaling_mode: ScalingMode::Proportional,
            overlay_backend: OverlayBackend::Raster,
            confidence: 50,
            time_update_ms: DEFAULT_TIME_UPDATE_MS,
            with_landmarks: false,
            with_descriptors: false,
            appearance: Appearance::System,
            high_contrast: false,
            font_scale: 1.0,
        }
    }
}

impl Settings {
    pub fn detection_options(&self) -> DetectionOptions {
        DetectionOptions {
            with_landmarks: self.with_landmarks,
            with_descriptors: self.with_descriptors,
        }
    }

    /// Detector confidence threshold as a fraction.
    pub fn confidence_threshold(&self) -> f64 {
        self.confidence.min(100) as f64 / 100.0
    }

    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(
            self.time_update_ms
                .clamp(TIME_UPDATE_MIN_MS, TIME_UPDATE_MAX_MS),
        )
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Facemark").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            self.save_to(&path);
        }
    }

    fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    log::warn!("Failed to save settings to {}: {e}", path.display());
                }
            }
            Err(e) => log::warn!("Failed to serialize settings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_overlay_behaviour() {
        let s = Settings::default();
        assert_eq!(s.scaling_mode, ScalingMode::Proportional);
        assert_eq!(s.detection_options(), DetectionOptions::default());
        assert_eq!(s.time_update_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_saved_settings_load_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("settings.json");
        let settings = Settings {
            overlay_backend: OverlayBackend::Shapes,
            with_landmarks: true,
            confidence: 70,
            ..Settings::default()
        };

        settings.save_to(&path);
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{ "scaling_mode": "unscaled", "appearance": "dark" }"#).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.scaling_mode, ScalingMode::Unscaled);
        assert_eq!(loaded.appearance, Appearance::Dark);
        assert_eq!(loaded.confidence, Settings::default().confidence);
    }

    #[test]
    fn test_corrupt_or_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        assert_eq!(Settings::load_from(&path), Settings::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_time_update_interval_is_clamped() {
        let fast = Settings {
            time_update_ms: 1,
            ..Settings::default()
        };
        let slow = Settings {
            time_update_ms: 60_000,
            ..Settings::default()
        };
        assert_eq!(fast.time_update_interval(), Duration::from_millis(TIME_UPDATE_MIN_MS));
        assert_eq!(slow.time_update_interval(), Duration::from_millis(TIME_UPDATE_MAX_MS));
    }

    #[test]
    fn test_confidence_threshold() {
        let s = Settings {
            confidence: 35,
            ..Settings::default()
        };
        assert_relative_eq!(s.confidence_threshold(), 0.35);
    }

    #[test]
    fn test_scaling_mode_maps_to_core() {
        assert_eq!(
            box_scaler::ScalingMode::from(ScalingMode::Unscaled),
            box_scaler::ScalingMode::Unscaled
        );
        assert_eq!(
            box_scaler::ScalingMode::from(ScalingMode::Proportional),
            box_scaler::ScalingMode::Proportional
        );
    }
}
