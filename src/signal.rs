//! SIGINT/SIGTERM -> shutdown flag plus a wake-up pipe.
//!
//! The flag alone cannot stop a thread already parked in `read`, and a
//! signal landing between the flag check and the `read` would be missed.
//! The handler therefore also writes a byte into a self-pipe, and the
//! source device polls that pipe next to its own fd.

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::OnceLock;

use nix::fcntl::OFlag;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::{pipe2, write};

use crate::error::Error;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static WAKE_WRITE: AtomicI32 = AtomicI32::new(-1);
static WAKE_PIPE: OnceLock<(OwnedFd, OwnedFd)> = OnceLock::new();

/// Handle returned by [`install`].
#[derive(Clone, Copy)]
pub struct Shutdown {
    pub flag: &'static AtomicBool,
    /// Becomes readable once a termination signal has arrived.
    pub wake: BorrowedFd<'static>,
}

extern "C" fn on_signal(_: nix::libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
    let fd: RawFd = WAKE_WRITE.load(Ordering::SeqCst);
    if fd >= 0 {
        // SAFETY: the write end lives in WAKE_PIPE for the rest of the process.
        let fd = unsafe { BorrowedFd::borrow_raw(fd) };
        // Non-blocking; a full pipe already means "wake up".
        let _ = write(fd, &[1u8]);
    }
}

pub fn install() -> Result<Shutdown, Error> {
    let pipe = match WAKE_PIPE.get() {
        Some(pipe) => pipe,
        None => {
            let fds = pipe2(OFlag::O_CLOEXEC | OFlag::O_NONBLOCK).map_err(Error::Signal)?;
            WAKE_PIPE.get_or_init(|| fds)
        }
    };
    WAKE_WRITE.store(pipe.1.as_raw_fd(), Ordering::SeqCst);

    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only touches atomics and calls write(2), both async-signal-safe.
        unsafe { sigaction(sig, &action) }.map_err(Error::Signal)?;
    }

    Ok(Shutdown {
        flag: &SHUTDOWN,
        wake: pipe.0.as_fd(),
    })
}
