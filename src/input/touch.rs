use super::event::{
    EventKind, RawEvent, ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_SLOT, ABS_MT_TRACKING_ID,
    BTN_LEFT,
};

/// Last known raw contact position and button state.
///
/// Only one contact drives the pointer: the first slot that gets a
/// tracking id keeps it until lifted. Until any slot is claimed (or on
/// streams without tracking ids) positions from every slot are taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchState {
    pub raw_x: i32,
    pub raw_y: i32,
    pub prev_raw_x: i32,
    pub prev_raw_y: i32,
    pub button_down: bool,
    pub(crate) current_slot: i32,
    pub(crate) tracked_slot: Option<i32>,
}

/// What an event did to the tracked state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Nothing downstream needs to happen.
    None,
    /// Raw X or Y moved.
    Moved,
    /// BTN_LEFT was reported; carries the new state.
    Button(bool),
}

impl TouchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the state. Unchanged positions are not
    /// significant; button reports always are.
    pub fn apply(&mut self, ev: &RawEvent) -> Change {
        match (ev.kind, ev.code) {
            (EventKind::AbsoluteAxis, ABS_MT_SLOT) => {
                self.current_slot = ev.value;
                Change::None
            }
            (EventKind::AbsoluteAxis, ABS_MT_TRACKING_ID) => {
                if ev.value >= 0 {
                    self.tracked_slot.get_or_insert(self.current_slot);
                } else if self.tracked_slot == Some(self.current_slot) {
                    self.tracked_slot = None;
                }
                Change::None
            }
            (EventKind::AbsoluteAxis, ABS_MT_POSITION_X | ABS_MT_POSITION_Y)
                if !self.follows_current_slot() =>
            {
                Change::None
            }
            (EventKind::AbsoluteAxis, ABS_MT_POSITION_X) => {
                self.raw_x = ev.value;
                let moved = self.raw_x != self.prev_raw_x;
                self.prev_raw_x = self.raw_x;
                if moved {
                    Change::Moved
                } else {
                    Change::None
                }
            }
            (EventKind::AbsoluteAxis, ABS_MT_POSITION_Y) => {
                self.raw_y = ev.value;
                let moved = self.raw_y != self.prev_raw_y;
                self.prev_raw_y = self.raw_y;
                if moved {
                    Change::Moved
                } else {
                    Change::None
                }
            }
            (EventKind::Key, BTN_LEFT) => {
                // 0 = release, 1 = press, 2 = autorepeat
                self.button_down = ev.value != 0;
                Change::Button(self.button_down)
            }
            _ => Change::None,
        }
    }

    fn follows_current_slot(&self) -> bool {
        self.tracked_slot.is_none_or(|slot| slot == self.current_slot)
    }
}
