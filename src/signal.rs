//! User interrupt (SIGINT) handling.
//!
//! The handler does nothing but store `true` into an atomic flag. The read loop
//! takes the flag at the top of every iteration, and the router and pipeline
//! coordinator check it between launches to abandon the rest of the line.

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static INSTALLED: OnceLock<Arc<AtomicBool>> = OnceLock::new();

extern "C" fn on_interrupt(_signo: nix::libc::c_int) {
    if let Some(flag) = INSTALLED.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptState {
    Normal,
    Interrupted,
}

/// Handle on the interrupt flag of one session.
#[derive(Debug, Clone, Default)]
pub struct SignalGateway {
    flag: Arc<AtomicBool>,
}

impl SignalGateway {
    /// Install the SIGINT handler for the process and return a gateway observing it.
    ///
    /// Installing twice is harmless; every gateway returned shares the same flag.
    pub fn install() -> nix::Result<Self> {
        let flag = INSTALLED
            .get_or_init(|| Arc::new(AtomicBool::new(false)))
            .clone();
        let action = SigAction::new(
            SigHandler::Handler(on_interrupt),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        // SAFETY: the handler only performs an atomic store.
        unsafe { sigaction(Signal::SIGINT, &action) }?;
        log::debug!("SIGINT handler installed");
        Ok(Self { flag })
    }

    /// A gateway not connected to any signal, for embedding and tests.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Move to INTERRUPTED. Used when the line editor reports Ctrl-C itself.
    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn state(&self) -> InterruptState {
        if self.flag.load(Ordering::SeqCst) {
            InterruptState::Interrupted
        } else {
            InterruptState::Normal
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.state() == InterruptState::Interrupted
    }

    /// Read and reset the flag, returning to NORMAL.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_resets_to_normal() {
        let gateway = SignalGateway::detached();
        assert_eq!(gateway.state(), InterruptState::Normal);
        assert!(!gateway.take());

        gateway.raise();
        assert_eq!(gateway.state(), InterruptState::Interrupted);
        assert!(gateway.take());
        assert_eq!(gateway.state(), InterruptState::Normal);
    }

    #[test]
    fn test_clones_share_the_flag() {
        let gateway = SignalGateway::detached();
        let other = gateway.clone();
        other.raise();
        assert!(gateway.is_interrupted());
    }

    #[test]
    fn test_delivered_sigint_sets_the_flag() {
        let gateway = SignalGateway::install().expect("install handler");
        gateway.take();

        nix::sys::signal::raise(Signal::SIGINT).expect("raise SIGINT");

        assert!(gateway.take());
        assert!(!gateway.is_interrupted());
    }
}
