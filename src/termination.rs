//! Cooperative termination of a running solve.
//!
//! A [`TerminationSignal`] is a cloneable flag shared between the encoder
//! and whoever wants to interrupt it. The loop checks the flag between
//! iterations; the external-solver driver polls it while waiting on the
//! child process and tears the child down when it fires. The best partial
//! solution found so far is always preserved.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use signal_hook::consts::SIGINT;
use signal_hook::consts::SIGTERM;
use signal_hook::SigId;

/// Cloneable handle used to abort a running [`crate::LeximaxSolver`].
#[derive(Debug, Clone, Default)]
pub struct TerminationSignal {
    flag: Arc<AtomicBool>,
}

impl TerminationSignal {
    pub fn new() -> TerminationSignal {
        TerminationSignal::default()
    }

    /// Requests termination. Safe to call from a signal handler context via
    /// [`SignalHandler`] or from another thread holding a clone.
    pub fn terminate(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether termination has been requested.
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Re-arms the flag, e.g. when the owning solver is cleared for reuse.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub(crate) fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Registers SIGTERM and SIGINT to trip a [`TerminationSignal`], so an
/// interrupted process forwards the termination to the external solver child
/// and flushes its partial result instead of dying mid-solve.
///
/// Registrations are removed again when the handler is dropped.
#[derive(Debug)]
pub struct SignalHandler {
    registrations: Vec<SigId>,
}

impl SignalHandler {
    pub fn install(signal: &TerminationSignal) -> Result<SignalHandler, std::io::Error> {
        let mut registrations = Vec::with_capacity(2);
        for sig in [SIGTERM, SIGINT] {
            registrations.push(signal_hook::flag::register(sig, signal.flag())?);
        }
        Ok(SignalHandler { registrations })
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        for id in self.registrations.drain(..) {
            let _ = signal_hook::low_level::unregister(id);
        }
    }
}
