use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};

use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::error::Error;

// EVIOCGRAB = _IOW('E', 0x90, int)
nix::ioctl_write_int!(eviocgrab, b'E', 0x90);

/// The physical touchpad, opened for blocking reads.
///
/// With `grab` the device is taken exclusively so the desktop's own
/// touchpad driver stops moving the cursor. The grab is released on drop.
///
/// With a wake fd attached, every read first polls the device together
/// with the wake fd. Once the wake fd is readable the read fails with
/// `Interrupted` instead of blocking.
pub struct SourceDevice {
    file: File,
    path: String,
    grabbed: bool,
    wake: Option<BorrowedFd<'static>>,
}

impl SourceDevice {
    pub fn open(path: &str, grab: bool) -> Result<Self, Error> {
        let file = File::open(path).map_err(|source| Error::OpenSource {
            path: path.into(),
            source,
        })?;
        log::info!("Opened {}", path);

        let mut device = Self {
            file,
            path: path.into(),
            grabbed: false,
            wake: None,
        };
        if grab {
            device.grab()?;
        }
        Ok(device)
    }

    pub fn with_wake(mut self, wake: BorrowedFd<'static>) -> Self {
        self.wake = Some(wake);
        self
    }

    fn grab(&mut self) -> Result<(), Error> {
        // SAFETY: the fd is owned by `self.file` and stays open for the call.
        unsafe { eviocgrab(self.file.as_raw_fd(), 1) }.map_err(|source| Error::Grab {
            path: self.path.clone(),
            source,
        })?;
        self.grabbed = true;
        log::info!("Grabbed {} (input restored on exit)", self.path);
        Ok(())
    }
}

impl Read for SourceDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(wake) = self.wake {
            if !wait_readable(self.file.as_fd(), wake)? {
                return Err(io::ErrorKind::Interrupted.into());
            }
        }
        self.file.read(buf)
    }
}

/// Block until `device` has data (`true`) or `wake` fires (`false`).
/// A pending wake-up wins over pending data.
fn wait_readable(device: BorrowedFd<'_>, wake: BorrowedFd<'_>) -> io::Result<bool> {
    let mut fds = [
        PollFd::new(device, PollFlags::POLLIN),
        PollFd::new(wake, PollFlags::POLLIN),
    ];
    poll(&mut fds, PollTimeout::NONE)?;
    let woken = fds[1]
        .revents()
        .is_some_and(|r| r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP));
    Ok(!woken)
}

impl Drop for SourceDevice {
    fn drop(&mut self) {
        if !self.grabbed {
            return;
        }
        // SAFETY: as in `grab`.
        match unsafe { eviocgrab(self.file.as_raw_fd(), 0) } {
            Ok(_) => log::info!("Released grab on {}", self.path),
            Err(e) => log::warn!("Could not release grab on {}: {}", self.path, e),
        }
    }
}
