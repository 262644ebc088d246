//! Termination signals for the long-running relay.
//!
//! `SIGINT` and `SIGTERM` are blocked in the calling thread before any worker
//! is spawned. Threads inherit the mask, so only the waiter thread started by
//! [`ShutdownSignals::notify`] ever sees them, through `sigwait`.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::info;

/// Blocked termination signals, waiting to be handed to a watcher thread.
pub struct ShutdownSignals {
    #[cfg(unix)]
    mask: libc::sigset_t,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Block `SIGINT` and `SIGTERM` for this thread and threads spawned from it.
    ///
    /// Call before starting the worker pool.
    pub fn block() -> io::Result<Self> {
        // SAFETY: `mask` is a plain C struct initialised by `sigemptyset`
        // before use; the pointers passed are valid for the calls.
        unsafe {
            let mut mask: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut mask);
            libc::sigaddset(&mut mask, libc::SIGINT);
            libc::sigaddset(&mut mask, libc::SIGTERM);
            let rc = libc::pthread_sigmask(libc::SIG_BLOCK, &mask, std::ptr::null_mut());
            if rc != 0 {
                return Err(io::Error::from_raw_os_error(rc));
            }
            Ok(Self { mask })
        }
    }

    /// Spawn a thread that sets `flag` when the first signal arrives.
    pub fn notify(self, flag: Arc<AtomicBool>) -> io::Result<Option<thread::JoinHandle<()>>> {
        let mask = self.mask;
        let handle = thread::Builder::new()
            .name("rr-signals".to_string())
            .spawn(move || {
                let mut sig: libc::c_int = 0;
                loop {
                    // SAFETY: `mask` and `sig` outlive the call.
                    if unsafe { libc::sigwait(&mask, &mut sig) } == 0 {
                        break;
                    }
                }
                info!(signal = sig, "shutdown signal received");
                flag.store(true, Ordering::SeqCst);
            })?;
        Ok(Some(handle))
    }
}

#[cfg(not(unix))]
impl ShutdownSignals {
    /// No signal masking on this platform.
    pub fn block() -> io::Result<Self> {
        Ok(Self {})
    }

    /// No watcher on this platform; the process is stopped externally.
    pub fn notify(self, _flag: Arc<AtomicBool>) -> io::Result<Option<thread::JoinHandle<()>>> {
        Ok(None)
    }
}
