//! Print decoded touchpad events for calibration and debugging.
//! Run: padtab dump  (Ctrl+C to stop). Useful for finding sensor_max_x/y.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::device::SourceDevice;
use crate::error::Error;
use crate::geometry::Mapper;
use crate::input::{code_name, Change, RawEvent, ReadOutcome, RecordReader, TouchState};
use crate::signal;

pub fn run_dump(config: &Config) -> Result<(), Error> {
    config.validate()?;
    let shutdown = signal::install()?;
    let path = config.device_path()?;
    let source = SourceDevice::open(&path, false)?.with_wake(shutdown.wake);
    let mapper = Mapper::new(&config.calibration);

    eprintln!("Dumping events from {} (Ctrl+C to stop):\n", path);
    let mut reader = RecordReader::new(source, config.record_layout);
    dump_events(&mut reader, &mapper, shutdown.flag, |line| println!("{}", line))
}

fn dump_events<R: Read>(
    reader: &mut RecordReader<R>,
    mapper: &Mapper,
    stop: &AtomicBool,
    mut out: impl FnMut(String),
) -> Result<(), Error> {
    let mut touch = TouchState::new();
    let mut n = 0u64;
    while !stop.load(Ordering::SeqCst) {
        let ev = match reader.next_record()? {
            ReadOutcome::Record(ev) => ev,
            ReadOutcome::Skipped => continue,
            ReadOutcome::Eof => break,
        };
        if ev.is_ignored() {
            continue;
        }
        n += 1;
        out(format_event(n, &ev, touch.apply(&ev), &touch, mapper));
    }
    Ok(())
}

fn format_event(n: u64, ev: &RawEvent, change: Change, touch: &TouchState, mapper: &Mapper) -> String {
    let line = format!("{:6}  {}  value={}", n, code_name(ev), ev.value);
    match change {
        Change::Moved => {
            let pos = mapper.map(touch);
            format!("{}  -> ({},{})", line, pos.x, pos.y)
        }
        _ => line,
    }
}
