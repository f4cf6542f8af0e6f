use std::io;

use thiserror::Error;

/// Fatal conditions. Anything that can be retried is handled inside the
/// record reader and never becomes an `Error`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open {path}: {source} (are you in the \"input\" group?)")]
    OpenSource { path: String, source: io::Error },

    #[error("cannot grab {path}: {source}")]
    Grab { path: String, source: nix::Error },

    #[error("cannot create virtual pointer: {0} (is /dev/uinput writable?)")]
    CreateDevice(#[source] io::Error),

    #[error("write to virtual pointer failed: {0}")]
    Emit(#[source] io::Error),

    #[error("read from source device failed: {0}")]
    Read(#[source] io::Error),

    #[error("device discovery failed: {0}")]
    Discovery(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot install signal handler: {0}")]
    Signal(#[source] nix::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("short record: expected {expected} bytes, got {actual}")]
    Short { expected: usize, actual: usize },
}
