use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// `struct input_event` on 32-bit targets (timeval 8 + type 2 + code 2 + value 4).
pub const INPUT_EVENT_SIZE_32: usize = 16;
/// `struct input_event` on 64-bit targets (timeval 16 + type 2 + code 2 + value 4).
pub const INPUT_EVENT_SIZE_64: usize = 24;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT: u16 = 0;

pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;

pub const BTN_LEFT: u16 = 0x110;
pub const BTN_TOUCH: u16 = 0x14a;

/// Size of one record in the stream read from the source device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordLayout {
    /// The host's own `input_event` layout.
    #[default]
    Native,
    /// 16-byte records, as produced on 32-bit systems.
    Compat32,
}

impl RecordLayout {
    pub fn record_size(self) -> usize {
        match self {
            RecordLayout::Native if cfg!(target_pointer_width = "64") => INPUT_EVENT_SIZE_64,
            RecordLayout::Native => INPUT_EVENT_SIZE_32,
            RecordLayout::Compat32 => INPUT_EVENT_SIZE_32,
        }
    }
}

impl fmt::Display for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordLayout::Native => write!(f, "native"),
            RecordLayout::Compat32 => write!(f, "compat32"),
        }
    }
}

impl FromStr for RecordLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(RecordLayout::Native),
            "compat32" | "compat-32" | "32" => Ok(RecordLayout::Compat32),
            _ => Err(format!(
                "Invalid record layout '{}'. Valid values: native, compat32",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Sync,
    Key,
    AbsoluteAxis,
    /// Any event type the tracker has no use for (EV_MSC, EV_REL, ...).
    Ignored,
}

impl EventKind {
    fn from_raw(ty: u16) -> Self {
        match ty {
            EV_SYN => EventKind::Sync,
            EV_KEY => EventKind::Key,
            EV_ABS => EventKind::AbsoluteAxis,
            _ => EventKind::Ignored,
        }
    }
}

/// One decoded `input_event`, minus its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: EventKind,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn is_ignored(&self) -> bool {
        self.kind == EventKind::Ignored
    }
}

/// Decode one record. Type, code and value are always the trailing eight
/// bytes, whatever the size of the timestamp in front of them.
pub fn decode(buf: &[u8], layout: RecordLayout) -> Result<RawEvent, DecodeError> {
    let size = layout.record_size();
    if buf.len() < size {
        return Err(DecodeError::Short {
            expected: size,
            actual: buf.len(),
        });
    }
    let base = size - 8;
    let ty = u16::from_le_bytes([buf[base], buf[base + 1]]);
    let code = u16::from_le_bytes([buf[base + 2], buf[base + 3]]);
    let value = i32::from_le_bytes([buf[base + 4], buf[base + 5], buf[base + 6], buf[base + 7]]);

    let kind = EventKind::from_raw(ty);
    if kind == EventKind::Ignored {
        return Ok(RawEvent {
            kind,
            code: 0,
            value: 0,
        });
    }
    Ok(RawEvent { kind, code, value })
}

/// Encode a record in the given layout with a zero timestamp.
#[cfg(test)]
pub fn encode(ty: u16, code: u16, value: i32, layout: RecordLayout) -> Vec<u8> {
    let size = layout.record_size();
    let mut buf = vec![0u8; size];
    let base = size - 8;
    buf[base..base + 2].copy_from_slice(&ty.to_le_bytes());
    buf[base + 2..base + 4].copy_from_slice(&code.to_le_bytes());
    buf[base + 4..].copy_from_slice(&value.to_le_bytes());
    buf
}

/// Human-readable name for an event, used by `padtab dump`.
pub fn code_name(ev: &RawEvent) -> String {
    match ev.kind {
        EventKind::Sync if ev.code == SYN_REPORT => "SYN_REPORT".into(),
        EventKind::Sync => format!("SYN/{}", ev.code),
        EventKind::Key => match ev.code {
            BTN_LEFT => "KEY/BTN_LEFT".into(),
            BTN_TOUCH => "KEY/BTN_TOUCH".into(),
            code => format!("KEY/{}", code),
        },
        EventKind::AbsoluteAxis => {
            let abs = match ev.code {
                ABS_X => "X",
                ABS_Y => "Y",
                ABS_MT_SLOT => "MT_SLOT",
                ABS_MT_POSITION_X => "MT_POSITION_X",
                ABS_MT_POSITION_Y => "MT_POSITION_Y",
                ABS_MT_TRACKING_ID => "MT_TRACKING_ID",
                _ => "?",
            };
            format!("ABS_{}({})", abs, ev.code)
        }
        EventKind::Ignored => "ignored".into(),
    }
}
