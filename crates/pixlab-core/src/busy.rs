//! Busy/idle guard
//!
//! At most one remote-backed session call runs at a time. Acquiring the
//! flag while it is held fails immediately; nothing is queued. The flag is
//! released when the [`BusyGuard`] drops, on success, error, or a dropped
//! future alike.

use crate::error::EditorError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared busy/idle flag
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    held: Arc<AtomicBool>,
}

impl BusyFlag {
    /// Idle flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the flag
    ///
    /// # Errors
    /// `Busy` if another guard is alive
    pub fn acquire(&self) -> Result<BusyGuard, EditorError> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard {
                held: Arc::clone(&self.held),
            })
            .map_err(|_| EditorError::Busy)
    }

    /// Whether a guard is currently alive
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of holding the busy flag; releases on drop
#[derive(Debug)]
#[must_use = "the flag is released as soon as the guard drops"]
pub struct BusyGuard {
    held: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_rejected_until_drop() {
        let flag = BusyFlag::new();
        let guard = flag.acquire().unwrap();
        assert!(flag.is_busy());
        assert_eq!(flag.acquire().unwrap_err(), EditorError::Busy);

        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.acquire().is_ok());
    }

    #[test]
    fn clones_share_state() {
        let flag = BusyFlag::new();
        let other = flag.clone();
        let _guard = flag.acquire().unwrap();
        assert!(other.is_busy());
    }
}
