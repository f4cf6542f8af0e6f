//! The synthesized pointer device on the uinput side.

use std::fmt;
use std::io;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use evdevil::event::{Abs, EventType, InputEvent, Key, Rel};
use evdevil::uinput::{AbsSetup, UinputDevice};
use evdevil::{AbsInfo, Bus, InputId, InputProp};
use serde::Deserialize;

use crate::error::Error;
use crate::geometry::{Calibration, ScreenPosition};
use crate::input::{ABS_X, ABS_Y, BTN_LEFT, EV_ABS, EV_KEY, EV_REL, EV_SYN, REL_X, REL_Y, SYN_REPORT};

const DEVICE_NAME: &str = "padtab virtual pointer";

/// Pause after the origin reset so the compositor applies it before we
/// start emitting deltas from (0, 0).
const RESET_SETTLE: Duration = Duration::from_millis(50);

/// How positions reach the consumer. Fixed for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointerMode {
    /// ABS_X / ABS_Y in screen coordinates.
    Absolute,
    /// REL_X / REL_Y deltas from the last emitted position.
    #[default]
    Relative,
}

impl fmt::Display for PointerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerMode::Absolute => write!(f, "absolute"),
            PointerMode::Relative => write!(f, "relative"),
        }
    }
}

impl FromStr for PointerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "absolute" | "abs" => Ok(PointerMode::Absolute),
            "relative" | "rel" => Ok(PointerMode::Relative),
            _ => Err(format!(
                "Invalid pointer mode '{}'. Valid values: absolute, relative",
                s
            )),
        }
    }
}

/// Where synthesized events go. Each call is one batch.
pub trait EventSink {
    fn write(&mut self, events: &[InputEvent]) -> io::Result<()>;
}

impl EventSink for UinputDevice {
    fn write(&mut self, events: &[InputEvent]) -> io::Result<()> {
        UinputDevice::write(self, events)
    }
}

fn event(ty: u16, code: u16, value: i32) -> InputEvent {
    InputEvent::new(EventType::from_raw(ty), code, value)
}

fn syn_report() -> InputEvent {
    event(EV_SYN, SYN_REPORT, 0)
}

/// Register BTN_LEFT plus either ABS_X/ABS_Y or REL_X/REL_Y and create the device.
pub fn create_device(mode: PointerMode, cal: &Calibration) -> Result<UinputDevice, Error> {
    build_device(mode, cal).map_err(Error::CreateDevice)
}

fn build_device(mode: PointerMode, cal: &Calibration) -> io::Result<UinputDevice> {
    let builder = UinputDevice::builder()?
        .with_input_id(InputId::new(Bus::from_raw(0x03), 0, 0, 0))?
        .with_keys([Key::BTN_LEFT])?;

    let builder = match mode {
        PointerMode::Absolute => {
            let (res_x, res_y) = cal.screen_resolution();
            // One-based: screen column 0 is emitted as 1.
            let axes = [
                AbsSetup::new(
                    Abs::X,
                    AbsInfo::new(1, cal.screen_width + 1).with_resolution(res_x),
                ),
                AbsSetup::new(
                    Abs::Y,
                    AbsInfo::new(1, cal.screen_height + 1).with_resolution(res_y),
                ),
            ];
            // No INPUT_PROP_DIRECT: libinput would expect BTN_TOUCH and treat
            // this as a touchscreen instead of an absolute mouse.
            builder.with_abs_axes(axes)?
        }
        PointerMode::Relative => builder
            .with_props([InputProp::POINTER])?
            .with_rel_axes([Rel::X, Rel::Y])?,
    };

    builder.build(DEVICE_NAME)
}

/// Owns the virtual device and the last position it was told about.
pub struct VirtualPointer<S: EventSink> {
    sink: S,
    mode: PointerMode,
    cur_pos: ScreenPosition,
    button_down: bool,
}

impl VirtualPointer<UinputDevice> {
    pub fn create(mode: PointerMode, cal: &Calibration) -> Result<Self, Error> {
        log::info!("Creating {} virtual pointer", mode);
        let device = create_device(mode, cal)?;
        if let Ok(name) = device.sysname() {
            log::info!(
                "Virtual pointer ready: /sys/devices/virtual/input/{}",
                name.to_string_lossy()
            );
        }
        Ok(Self::with_sink(device, mode))
    }
}

impl<S: EventSink> VirtualPointer<S> {
    pub fn with_sink(sink: S, mode: PointerMode) -> Self {
        Self {
            sink,
            mode,
            cur_pos: ScreenPosition::default(),
            button_down: false,
        }
    }

    pub fn mode(&self) -> PointerMode {
        self.mode
    }

    pub fn cur_pos(&self) -> ScreenPosition {
        self.cur_pos
    }

    #[cfg(test)]
    pub fn button_down(&self) -> bool {
        self.button_down
    }

    /// `pos` must already be clamped to the screen.
    pub fn emit_position(&mut self, pos: ScreenPosition) -> Result<(), Error> {
        let batch = match self.mode {
            PointerMode::Absolute => [
                event(EV_ABS, ABS_X, pos.x + 1),
                event(EV_ABS, ABS_Y, pos.y + 1),
                syn_report(),
            ],
            PointerMode::Relative => [
                event(EV_REL, REL_X, pos.x - self.cur_pos.x),
                event(EV_REL, REL_Y, pos.y - self.cur_pos.y),
                syn_report(),
            ],
        };
        self.sink.write(&batch).map_err(Error::Emit)?;
        self.cur_pos = pos;
        Ok(())
    }

    pub fn emit_button(&mut self, pressed: bool) -> Result<(), Error> {
        let batch = [event(EV_KEY, BTN_LEFT, i32::from(pressed)), syn_report()];
        self.sink.write(&batch).map_err(Error::Emit)?;
        self.button_down = pressed;
        Ok(())
    }

    /// Slam the real cursor into the top-left corner so relative deltas
    /// start from a known (0, 0). No-op in absolute mode.
    pub fn reset_to_origin(&mut self) -> Result<(), Error> {
        self.reset_to_origin_with(RESET_SETTLE)
    }

    fn reset_to_origin_with(&mut self, settle: Duration) -> Result<(), Error> {
        if self.mode != PointerMode::Relative {
            return Ok(());
        }
        let batch = [
            event(EV_REL, REL_X, i32::MIN),
            event(EV_REL, REL_Y, i32::MIN),
            syn_report(),
        ];
        self.sink.write(&batch).map_err(Error::Emit)?;
        self.cur_pos = ScreenPosition::default();
        thread::sleep(settle);
        log::info!("Pointer reset to origin");
        Ok(())
    }

    pub fn release_button(&mut self) -> Result<(), Error> {
        if !self.button_down {
            return Ok(());
        }
        self.emit_button(false)
    }

    /// Release a held button, then drop the device. The kernel removes a
    /// uinput device when its handle closes.
    pub fn destroy(mut self) {
        if let Err(e) = self.release_button() {
            log::warn!("Could not release button before teardown: {}", e);
        }
        log::info!("Destroying virtual pointer");
    }

    #[cfg(test)]
    pub(crate) fn sink(&self) -> &S {
        &self.sink
    }
}
