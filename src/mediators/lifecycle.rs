use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::MediationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Initializing = 1,
    Initialized = 2,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => LifecycleState::Initializing,
            2 => LifecycleState::Initialized,
            _ => LifecycleState::Uninitialized,
        }
    }
}

/// Init-once / destroy-once guard for deployable artifacts.
///
/// `init` and `destroy` serialize on one lock. The state itself is an atomic
/// so readers never block; a reader racing a redeploy may see the state just
/// before or just after a transition, never a torn one.
#[derive(Debug)]
pub struct Lifecycle {
    transition: Mutex<()>,
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            transition: Mutex::new(()),
            state: AtomicU8::new(LifecycleState::Uninitialized as u8),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == LifecycleState::Initialized
    }

    pub fn is_initializing(&self) -> bool {
        self.state() == LifecycleState::Initializing
    }

    /// Run `init` unless already initialized. Returns whether it ran.
    ///
    /// A failing `init` leaves the artifact uninitialized.
    pub fn initialize<F>(&self, init: F) -> Result<bool, MediationError>
    where
        F: FnOnce() -> Result<(), MediationError>,
    {
        let _guard = self.transition.lock();
        if self.is_initialized() {
            return Ok(false);
        }

        self.set(LifecycleState::Initializing);
        match init() {
            Ok(()) => {
                self.set(LifecycleState::Initialized);
                Ok(true)
            }
            Err(e) => {
                self.set(LifecycleState::Uninitialized);
                Err(e)
            }
        }
    }

    /// Run `destroy` only when initialized. Returns whether it ran.
    pub fn destroy<F>(&self, destroy: F) -> bool
    where
        F: FnOnce(),
    {
        let _guard = self.transition.lock();
        if !self.is_initialized() {
            return false;
        }

        destroy();
        self.set(LifecycleState::Uninitialized);
        true
    }

    fn set(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn initialize_runs_once() {
        let lifecycle = Lifecycle::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            lifecycle
                .initialize(|| {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(lifecycle.is_initialized());
    }

    #[test]
    fn destroy_is_noop_unless_initialized() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.destroy(|| panic!("must not run")));

        lifecycle.initialize(|| Ok(())).unwrap();
        assert!(lifecycle.destroy(|| {}));
        assert!(!lifecycle.destroy(|| panic!("must not run twice")));
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn failed_init_can_be_retried() {
        let lifecycle = Lifecycle::new();
        let result = lifecycle.initialize(|| Err(MediationError::configuration("bad child")));
        assert!(result.is_err());
        assert!(!lifecycle.is_initialized());

        assert!(lifecycle.initialize(|| Ok(())).unwrap());
    }

    #[test]
    fn init_observes_initializing_state() {
        let lifecycle = Lifecycle::new();
        lifecycle
            .initialize(|| {
                assert!(lifecycle.is_initializing());
                Ok(())
            })
            .unwrap();
    }
}
