use std::io::{self, Read};

use super::event::{decode, RawEvent, RecordLayout};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Record(RawEvent),
    /// No complete record yet (partial or interrupted read). Retry.
    Skipped,
    /// The stream is exhausted.
    Eof,
}

/// Pulls fixed-size records off a blocking byte stream.
///
/// A read may deliver less than a record (pipes, replayed captures). The
/// partial bytes are kept and completed by later reads so the stream never
/// drifts off record boundaries.
pub struct RecordReader<R> {
    inner: R,
    layout: RecordLayout,
    buf: Vec<u8>,
    filled: usize,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R, layout: RecordLayout) -> Self {
        Self {
            inner,
            layout,
            buf: vec![0u8; layout.record_size()],
            filled: 0,
        }
    }

    /// Read one record. Nothing is decoded until all of its bytes are in.
    pub fn next_record(&mut self) -> Result<ReadOutcome, Error> {
        match self.inner.read(&mut self.buf[self.filled..]) {
            Ok(0) => {
                if self.filled > 0 {
                    log::debug!("Stream ended inside a record ({} bytes dropped)", self.filled);
                }
                Ok(ReadOutcome::Eof)
            }
            Ok(n) if self.filled + n < self.buf.len() => {
                self.filled += n;
                log::debug!(
                    "Short read ({} of {} bytes), waiting for the rest",
                    self.filled,
                    self.buf.len()
                );
                Ok(ReadOutcome::Skipped)
            }
            Ok(_) => {
                self.filled = 0;
                match decode(&self.buf, self.layout) {
                    Ok(ev) => Ok(ReadOutcome::Record(ev)),
                    Err(e) => {
                        log::debug!("Skipping record: {}", e);
                        Ok(ReadOutcome::Skipped)
                    }
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) => {
                Ok(ReadOutcome::Skipped)
            }
            Err(e) => Err(Error::Read(e)),
        }
    }
}
