use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::geometry::Calibration;
use crate::input::RecordLayout;
use crate::pointer::PointerMode;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub device: Option<String>,
    #[serde(default)]
    pub mode: PointerMode,
    #[serde(default = "default_true")]
    pub grab: bool,
    #[serde(default)]
    pub record_layout: RecordLayout,
    pub settle_ms: Option<u64>,
    #[serde(default)]
    pub calibration: Calibration,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            device: None,
            mode: PointerMode::default(),
            grab: true,
            record_layout: RecordLayout::default(),
            settle_ms: None,
            calibration: Calibration::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_from_default_paths() -> Option<FileConfig> {
    for path in default_config_paths() {
        if path.exists() {
            if let Some(config) = load_from_path(&path) {
                return Some(config);
            }
        }
    }
    None
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("padtab.toml"));

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("padtab.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_full_file() {
        let file = write_config(
            r#"
device = "/dev/input/event5"
mode = "absolute"
grab = false
record_layout = "compat32"
settle_ms = 200

[calibration]
sensor_max_x = 3528
sensor_max_y = 1793
sensor_width_mm = 114
sensor_height_mm = 58
working_width_mm = 114
working_height_mm = 58
screen_width = 1920
screen_height = 1200
"#,
        );
        let config = load_from_path(file.path()).unwrap();
        assert_eq!(config.device.as_deref(), Some("/dev/input/event5"));
        assert_eq!(config.mode, PointerMode::Absolute);
        assert!(!config.grab);
        assert_eq!(config.record_layout, RecordLayout::Compat32);
        assert_eq!(config.settle_ms, Some(200));
        assert_eq!(config.calibration.sensor_max_x, 3528);
        assert_eq!(config.calibration.sensor_width_mm, 114.0);
        assert_eq!(config.calibration.screen_height, 1200);
    }

    #[test]
    fn test_partial_calibration_keeps_defaults() {
        let file = write_config("[calibration]\nscreen_width = 2560\n");
        let config = load_from_path(file.path()).unwrap();
        assert!(config.grab);
        assert_eq!(config.mode, PointerMode::Relative);
        assert_eq!(config.calibration.screen_width, 2560);
        assert_eq!(config.calibration.screen_height, 1080);
        assert_eq!(config.calibration.sensor_max_x, 3192);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let file = write_config("orientation = \"portrait\"\n");
        assert!(load_from_path(file.path()).is_none());
    }

    #[test]
    fn test_missing_file() {
        assert!(load_from_path(Path::new("/nonexistent/padtab.toml")).is_none());
    }
}
