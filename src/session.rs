//! The read -> track -> map -> emit loop.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Error;
use crate::geometry::Mapper;
use crate::input::{Change, ReadOutcome, RecordReader, TouchState};
use crate::pointer::{EventSink, PointerMode, VirtualPointer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Setup,
    Running,
    Teardown,
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Complete records decoded.
    pub records: u64,
    /// Reads that produced no record (short, interrupted).
    pub skipped: u64,
    /// Position and button updates sent to the virtual pointer.
    pub updates: u64,
}

/// Owns both ends for the lifetime of one run. Dropping the session drops
/// the source (releasing any grab) and the virtual device.
pub struct Session<R: Read, S: EventSink> {
    reader: RecordReader<R>,
    pointer: Option<VirtualPointer<S>>,
    mapper: Mapper,
    touch: TouchState,
    state: SessionState,
}

impl<R: Read, S: EventSink> Session<R, S> {
    /// Both resources are already open, so a new session is in `Setup`.
    pub fn new(reader: RecordReader<R>, pointer: VirtualPointer<S>, mapper: Mapper) -> Self {
        let mut session = Self {
            reader,
            pointer: Some(pointer),
            mapper,
            touch: TouchState::new(),
            state: SessionState::Idle,
        };
        session.set_state(SessionState::Setup);
        session
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    pub fn touch(&self) -> &TouchState {
        &self.touch
    }

    #[cfg(test)]
    pub fn pointer(&self) -> Option<&VirtualPointer<S>> {
        self.pointer.as_ref()
    }

    /// Run until `stop` is raised, the stream ends or a fatal error occurs.
    /// Teardown runs on every one of those paths.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<SessionSummary, Error> {
        let mut summary = SessionSummary::default();
        let result = self.start().and_then(|()| self.run_loop(stop, &mut summary));
        self.teardown();
        let last = self.pointer.as_ref().map(|p| p.cur_pos()).unwrap_or_default();
        log::info!(
            "Session ended: {} records, {} skipped reads, {} updates, last position ({},{})",
            summary.records,
            summary.skipped,
            summary.updates,
            last.x,
            last.y
        );
        result.map(|()| summary)
    }

    /// Retire the virtual device. The source is released when `self` drops.
    pub fn finish(mut self) {
        if let Some(pointer) = self.pointer.take() {
            pointer.destroy();
        }
        self.set_state(SessionState::Done);
    }

    fn start(&mut self) -> Result<(), Error> {
        let Some(pointer) = self.pointer.as_mut() else {
            return Ok(());
        };
        if pointer.mode() == PointerMode::Relative {
            pointer.reset_to_origin()?;
        }
        self.set_state(SessionState::Running);
        log::info!("Tracking started");
        Ok(())
    }

    fn run_loop(&mut self, stop: &AtomicBool, summary: &mut SessionSummary) -> Result<(), Error> {
        let Some(pointer) = self.pointer.as_mut() else {
            return Ok(());
        };

        while !stop.load(Ordering::SeqCst) {
            let ev = match self.reader.next_record()? {
                ReadOutcome::Record(ev) => ev,
                ReadOutcome::Skipped => {
                    summary.skipped += 1;
                    continue;
                }
                ReadOutcome::Eof => {
                    log::info!("Source stream ended");
                    break;
                }
            };
            summary.records += 1;

            if ev.is_ignored() {
                continue;
            }

            match self.touch.apply(&ev) {
                Change::None => continue,
                Change::Moved => pointer.emit_position(self.mapper.map(&self.touch))?,
                Change::Button(pressed) => pointer.emit_button(pressed)?,
            }
            log_progress(&mut summary.updates);
        }

        if stop.load(Ordering::SeqCst) {
            log::info!("Termination requested");
        }
        Ok(())
    }

    fn teardown(&mut self) {
        self.set_state(SessionState::Teardown);
        if let Some(pointer) = self.pointer.as_mut() {
            if let Err(e) = pointer.release_button() {
                log::warn!("Could not release button: {}", e);
            }
        }
    }

    fn set_state(&mut self, next: SessionState) {
        log::debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn log_progress(updates: &mut u64) {
    if *updates == 0 {
        log::info!("Touch events flowing");
    }
    *updates += 1;

    if (*updates).is_multiple_of(500) {
        log::debug!("Pointer updates: {}", updates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Calibration, ScreenPosition};
    use crate::input::{
        encode, RecordLayout, ABS_MT_POSITION_X, ABS_MT_POSITION_Y, BTN_LEFT, EV_ABS, EV_KEY,
        EV_REL, EV_SYN, REL_X, REL_Y, SYN_REPORT,
    };
    use crate::pointer::testing::RecordingSink;
    use std::io::Cursor;

    const LAYOUT: RecordLayout = RecordLayout::Native;
    const SYN: (u16, u16, i32) = (EV_SYN, SYN_REPORT, 0);

    fn stream(records: &[(u16, u16, i32)]) -> Vec<u8> {
        records
            .iter()
            .flat_map(|&(ty, code, value)| encode(ty, code, value, LAYOUT))
            .collect()
    }

    fn session(bytes: Vec<u8>, mode: PointerMode) -> Session<Cursor<Vec<u8>>, RecordingSink> {
        let reader = RecordReader::new(Cursor::new(bytes), LAYOUT);
        let pointer = VirtualPointer::with_sink(RecordingSink::default(), mode);
        Session::new(reader, pointer, Mapper::new(&Calibration::default()))
    }

    fn emitted(session: &Session<Cursor<Vec<u8>>, RecordingSink>) -> Vec<(u16, u16, i32)> {
        session.pointer().unwrap().sink().events()
    }

    #[test]
    fn test_midpoint_maps_to_screen_center() {
        let bytes = stream(&[
            (EV_ABS, ABS_MT_POSITION_X, 1596),
            (EV_ABS, ABS_MT_POSITION_Y, 912),
            SYN,
        ]);
        let mut s = session(bytes, PointerMode::Absolute);
        let summary = s.run(&AtomicBool::new(false)).unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(summary.updates, 2);
        assert_eq!((s.touch().raw_x, s.touch().raw_y), (1596, 912));
        assert_eq!(s.pointer().unwrap().cur_pos(), ScreenPosition::new(960, 540));
        assert_eq!(s.state(), SessionState::Teardown);
        s.finish();
    }

    #[test]
    fn test_unchanged_position_is_not_reemitted() {
        let bytes = stream(&[
            (EV_ABS, ABS_MT_POSITION_X, 1596),
            SYN,
            (EV_ABS, ABS_MT_POSITION_X, 1596),
            SYN,
            (EV_ABS, ABS_MT_POSITION_X, 1596),
        ]);
        let mut s = session(bytes, PointerMode::Absolute);
        let summary = s.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(summary.updates, 1);
        assert_eq!(s.pointer().unwrap().sink().batches.len(), 1);
    }

    #[test]
    fn test_button_press_release_without_motion() {
        let bytes = stream(&[(EV_KEY, BTN_LEFT, 1), SYN, (EV_KEY, BTN_LEFT, 0), SYN]);
        let mut s = session(bytes, PointerMode::Absolute);
        s.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(
            emitted(&s),
            vec![(EV_KEY, BTN_LEFT, 1), SYN, (EV_KEY, BTN_LEFT, 0), SYN]
        );
    }

    #[test]
    fn test_relative_mode_resets_then_tracks() {
        let bytes = stream(&[
            (EV_ABS, ABS_MT_POSITION_X, 1596),
            (EV_ABS, ABS_MT_POSITION_Y, 912),
            SYN,
        ]);
        let mut s = session(bytes, PointerMode::Relative);
        s.run(&AtomicBool::new(false)).unwrap();

        let events = emitted(&s);
        assert_eq!(&events[..3], &[(EV_REL, REL_X, i32::MIN), (EV_REL, REL_Y, i32::MIN), SYN]);
        let (dx, dy) = events[3..].iter().fold((0, 0), |(dx, dy), &(ty, code, v)| {
            match (ty, code) {
                (EV_REL, REL_X) => (dx + v, dy),
                (EV_REL, REL_Y) => (dx, dy + v),
                _ => (dx, dy),
            }
        });
        assert_eq!((dx, dy), (960, 540));
    }

    #[test]
    fn test_unknown_events_are_dropped() {
        let bytes = stream(&[(0x04, 0x05, 1234), (EV_KEY, 0x14a, 1), SYN]);
        let mut s = session(bytes, PointerMode::Absolute);
        let summary = s.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.updates, 0);
        assert!(emitted(&s).is_empty());
    }

    #[test]
    fn test_stop_flag_ends_before_reading() {
        let bytes = stream(&[(EV_KEY, BTN_LEFT, 1)]);
        let mut s = session(bytes, PointerMode::Absolute);
        let summary = s.run(&AtomicBool::new(true)).unwrap();
        assert_eq!(summary.records, 0);
        assert_eq!(s.state(), SessionState::Teardown);
    }

    #[test]
    fn test_signal_during_read_ends_loop() {
        use std::sync::Arc;

        // Stands in for a grabbed, idle pad: the only way out of `read` is
        // the wake-up that accompanies a termination signal.
        struct Parked {
            stop: Arc<AtomicBool>,
            reads: usize,
        }
        impl Read for Parked {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                self.reads += 1;
                assert_eq!(self.reads, 1, "read again after shutdown");
                self.stop.store(true, Ordering::SeqCst);
                Err(std::io::ErrorKind::Interrupted.into())
            }
        }

        let stop = Arc::new(AtomicBool::new(false));
        let parked = Parked {
            stop: Arc::clone(&stop),
            reads: 0,
        };
        let reader = RecordReader::new(parked, LAYOUT);
        let pointer = VirtualPointer::with_sink(RecordingSink::default(), PointerMode::Absolute);
        let mut s = Session::new(reader, pointer, Mapper::new(&Calibration::default()));

        let summary = s.run(&stop).unwrap();
        assert_eq!(summary.records, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(s.state(), SessionState::Teardown);
        s.finish();
    }

    #[test]
    fn test_teardown_releases_held_button() {
        let bytes = stream(&[(EV_KEY, BTN_LEFT, 1), SYN]);
        let mut s = session(bytes, PointerMode::Absolute);
        s.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(
            emitted(&s),
            vec![(EV_KEY, BTN_LEFT, 1), SYN, (EV_KEY, BTN_LEFT, 0), SYN]
        );
        assert!(!s.pointer().unwrap().button_down());
    }

    #[test]
    fn test_read_error_still_tears_down() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("device unplugged"))
            }
        }
        let reader = RecordReader::new(Broken, LAYOUT);
        let pointer = VirtualPointer::with_sink(RecordingSink::default(), PointerMode::Absolute);
        let mut s = Session::new(reader, pointer, Mapper::new(&Calibration::default()));

        assert!(matches!(s.run(&AtomicBool::new(false)), Err(Error::Read(_))));
        assert_eq!(s.state(), SessionState::Teardown);
        s.finish();
    }
}
