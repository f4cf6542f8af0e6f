//! Raw sensor coordinates to screen coordinates.
//!
//! A working area (in millimetres) is cut out of the centre of the sensor
//! and stretched over the whole screen. Contacts outside the working area
//! pin to the nearest screen edge.

use serde::Deserialize;

use crate::input::TouchState;

/// Sensor, working area and screen geometry. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Calibration {
    pub sensor_max_x: i32,
    pub sensor_max_y: i32,
    pub sensor_width_mm: f64,
    pub sensor_height_mm: f64,
    pub working_width_mm: f64,
    pub working_height_mm: f64,
    pub screen_width: i32,
    pub screen_height: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            sensor_max_x: 3192,
            sensor_max_y: 1824,
            sensor_width_mm: 105.0,
            sensor_height_mm: 61.0,
            working_width_mm: 75.0,
            working_height_mm: 55.0,
            screen_width: 1920,
            screen_height: 1080,
        }
    }
}

impl Calibration {
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("sensor_max_x", self.sensor_max_x as f64),
            ("sensor_max_y", self.sensor_max_y as f64),
            ("sensor_width_mm", self.sensor_width_mm),
            ("sensor_height_mm", self.sensor_height_mm),
            ("working_width_mm", self.working_width_mm),
            ("working_height_mm", self.working_height_mm),
            ("screen_width", self.screen_width as f64),
            ("screen_height", self.screen_height as f64),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{} must be positive, got {}", name, value));
            }
        }
        Ok(())
    }

    /// Screen units per working-area millimetre, as advertised on the
    /// absolute axes of the virtual device.
    pub fn screen_resolution(&self) -> (i32, i32) {
        let x = (self.screen_width as f64 / self.working_width_mm).round() as i32;
        let y = (self.screen_height as f64 / self.working_height_mm).round() as i32;
        (x.max(1), y.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenPosition {
    pub x: i32,
    pub y: i32,
}

impl ScreenPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Precomputed transform for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisMap {
    /// Half of the sensor span left over around the working area, in sensor units.
    offset: f64,
    /// Screen units per sensor unit inside the working area.
    scale: f64,
    screen_max: i32,
}

impl AxisMap {
    fn new(sensor_max: i32, sensor_mm: f64, working_mm: f64, screen_max: i32) -> Self {
        let units_per_mm = sensor_max as f64 / sensor_mm;
        let working_units = units_per_mm * working_mm;
        let leftover_units = sensor_max as f64 - working_units;
        Self {
            offset: leftover_units / 2.0,
            scale: screen_max as f64 / working_units,
            screen_max,
        }
    }

    fn map(&self, raw: i32) -> i32 {
        let mapped = ((raw as f64 - self.offset) * self.scale).round();
        mapped.clamp(0.0, self.screen_max as f64) as i32
    }
}

/// Maps raw touch coordinates onto the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapper {
    x: AxisMap,
    y: AxisMap,
}

impl Mapper {
    pub fn new(cal: &Calibration) -> Self {
        Self {
            x: AxisMap::new(
                cal.sensor_max_x,
                cal.sensor_width_mm,
                cal.working_width_mm,
                cal.screen_width,
            ),
            y: AxisMap::new(
                cal.sensor_max_y,
                cal.sensor_height_mm,
                cal.working_height_mm,
                cal.screen_height,
            ),
        }
    }

    pub fn map_raw(&self, raw_x: i32, raw_y: i32) -> ScreenPosition {
        ScreenPosition::new(self.x.map(raw_x), self.y.map(raw_y))
    }

    pub fn map(&self, touch: &TouchState) -> ScreenPosition {
        self.map_raw(touch.raw_x, touch.raw_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_area() -> Calibration {
        Calibration {
            working_width_mm: 105.0,
            working_height_mm: 61.0,
            ..Calibration::default()
        }
    }

    #[test]
    fn test_full_area_is_pure_scale() {
        let mapper = Mapper::new(&full_area());
        assert_eq!(mapper.map_raw(0, 0), ScreenPosition::new(0, 0));
        assert_eq!(mapper.map_raw(3192, 1824), ScreenPosition::new(1920, 1080));
        assert_eq!(mapper.map_raw(1596, 912), ScreenPosition::new(960, 540));
    }

    #[test]
    fn test_working_area_is_centered() {
        let mapper = Mapper::new(&Calibration::default());
        assert_eq!(mapper.map_raw(1596, 912), ScreenPosition::new(960, 540));
    }

    #[test]
    fn test_working_area_edges_hit_screen_edges() {
        let cal = Calibration::default();
        let mapper = Mapper::new(&cal);
        // 3192 units over 105 mm, 75 mm working area -> 2280 units, 456 either side.
        assert_eq!(mapper.map_raw(456, 912).x, 0);
        assert_eq!(mapper.map_raw(456 + 2280, 912).x, 1920);
        assert_eq!(mapper.map_raw(456 + 1140, 912).x, 960);
    }

    #[test]
    fn test_clamps_outside_working_area() {
        let mapper = Mapper::new(&Calibration::default());
        for (raw_x, raw_y) in [(0, 0), (3192, 1824), (-50, -50), (9000, 9000), (100, 1800)] {
            let pos = mapper.map_raw(raw_x, raw_y);
            assert!((0..=1920).contains(&pos.x), "x {} out of range", pos.x);
            assert!((0..=1080).contains(&pos.y), "y {} out of range", pos.y);
        }
        assert_eq!(mapper.map_raw(0, 0), ScreenPosition::new(0, 0));
        assert_eq!(mapper.map_raw(3192, 1824), ScreenPosition::new(1920, 1080));
    }

    #[test]
    fn test_axes_are_independent() {
        let cal = Calibration {
            working_height_mm: 61.0,
            ..Calibration::default()
        };
        let mapper = Mapper::new(&cal);
        // Y uses the full sensor height, X keeps its centred 75 mm window.
        assert_eq!(mapper.map_raw(456, 1824), ScreenPosition::new(0, 1080));
    }

    #[test]
    fn test_map_touch_state() {
        let mapper = Mapper::new(&full_area());
        let touch = TouchState {
            raw_x: 3192,
            raw_y: 0,
            ..TouchState::default()
        };
        assert_eq!(mapper.map(&touch), ScreenPosition::new(1920, 0));
    }

    #[test]
    fn test_validate_rejects_zero() {
        let cal = Calibration {
            working_width_mm: 0.0,
            ..Calibration::default()
        };
        assert!(cal.validate().is_err());
        assert!(Calibration::default().validate().is_ok());
    }

    #[test]
    fn test_screen_resolution() {
        // 1920 px / 75 mm = 25.6, 1080 px / 55 mm = 19.6
        assert_eq!(Calibration::default().screen_resolution(), (26, 20));
    }
}
