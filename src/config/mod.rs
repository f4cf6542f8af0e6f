mod cli;
mod file;

pub use cli::{Cli, Command};

use std::time::Duration;

use crate::device;
use crate::error::Error;
use crate::geometry::Calibration;
use crate::input::RecordLayout;
use crate::pointer::PointerMode;

const DEFAULT_SETTLE_MS: u64 = 1000;

/// Merged configuration from CLI args and TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub device: Option<String>,
    pub mode: PointerMode,
    pub grab: bool,
    pub record_layout: RecordLayout,
    pub settle_ms: u64,
    pub calibration: Calibration,
}

impl Config {
    /// Load configuration by merging TOML file with CLI overrides.
    pub fn load(cli: &Cli) -> Self {
        let file_config = cli
            .config
            .as_ref()
            .and_then(|p| file::load_from_path(p))
            .or_else(file::load_from_default_paths)
            .unwrap_or_default();

        Self::merge(cli, file_config)
    }

    fn merge(cli: &Cli, file_config: file::FileConfig) -> Self {
        let mut cal = file_config.calibration;
        if let Some(v) = cli.sensor_max_x {
            cal.sensor_max_x = v;
        }
        if let Some(v) = cli.sensor_max_y {
            cal.sensor_max_y = v;
        }
        if let Some(v) = cli.sensor_width_mm {
            cal.sensor_width_mm = v;
        }
        if let Some(v) = cli.sensor_height_mm {
            cal.sensor_height_mm = v;
        }
        if let Some(v) = cli.working_width_mm {
            cal.working_width_mm = v;
        }
        if let Some(v) = cli.working_height_mm {
            cal.working_height_mm = v;
        }
        if let Some(v) = cli.screen_width {
            cal.screen_width = v;
        }
        if let Some(v) = cli.screen_height {
            cal.screen_height = v;
        }

        Self {
            device: cli.device.clone().or(file_config.device),
            mode: cli.mode.unwrap_or(file_config.mode),
            grab: !cli.no_grab && file_config.grab,
            record_layout: cli.record_layout.unwrap_or(file_config.record_layout),
            settle_ms: cli
                .settle_ms
                .or(file_config.settle_ms)
                .unwrap_or(DEFAULT_SETTLE_MS),
            calibration: cal,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.calibration.validate().map_err(Error::Config)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// The configured device, or the first touchpad the kernel lists.
    pub fn device_path(&self) -> Result<String, Error> {
        match &self.device {
            Some(path) => Ok(path.clone()),
            None => device::find_touchpad(),
        }
    }
}
