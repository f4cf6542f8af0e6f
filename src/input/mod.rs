mod event;
mod reader;
mod touch;

pub use event::{code_name, RawEvent, RecordLayout};
pub use reader::{ReadOutcome, RecordReader};
pub use touch::{Change, TouchState};

pub(crate) use event::{
    BTN_LEFT, EV_ABS, EV_KEY, EV_REL, EV_SYN, ABS_X, ABS_Y, REL_X, REL_Y, SYN_REPORT,
};

#[cfg(test)]
pub(crate) use event::{encode, ABS_MT_POSITION_X, ABS_MT_POSITION_Y};
