//! Exclusive checkout of (username, slot) pairs.
//!
//! Record stores do not lock anything themselves, so two sessions holding the
//! same character would overwrite each other's saves. Every persistent
//! session takes a [`SlotLease`] from the shared [`SlotRegistry`] first and
//! keeps it for as long as its store is alive.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

type SlotKey = (String, usize);

/// The set of character slots currently held by a session.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    active: Mutex<HashSet<SlotKey>>,
}

impl SlotRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take exclusive hold of `username`'s `slot`.
    ///
    /// # Errors
    /// [`SessionError::SlotActive`] if another lease holds it.
    pub fn checkout(self: &Arc<Self>, username: &str, slot: usize) -> Result<SlotLease> {
        let key = (username.to_string(), slot);
        if !self.active.lock().insert(key.clone()) {
            warn!(username, slot, "Rejected second checkout of active slot");
            return Err(SessionError::SlotActive {
                username: username.to_string(),
                slot,
            });
        }
        debug!(username, slot, "Slot checked out");
        Ok(SlotLease {
            registry: Arc::clone(self),
            key,
        })
    }

    /// Whether `username`'s `slot` is held.
    #[must_use]
    pub fn is_active(&self, username: &str, slot: usize) -> bool {
        self.active.lock().contains(&(username.to_string(), slot))
    }

    /// Number of held slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    /// Whether no slot is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }

    fn check_in(&self, key: &SlotKey) {
        self.active.lock().remove(key);
        debug!(username = %key.0, slot = key.1, "Slot checked in");
    }
}

/// Proof of exclusive hold on one character slot. Dropping it checks the
/// slot back in.
#[derive(Debug)]
pub struct SlotLease {
    registry: Arc<SlotRegistry>,
    key: SlotKey,
}

impl SlotLease {
    /// Account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.key.0
    }

    /// Zero-based slot.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.key.1
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        self.registry.check_in(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_checkout_is_rejected_until_drop() {
        let registry = Arc::new(SlotRegistry::new());
        let lease = registry.checkout("ash", 0).expect("first");
        assert!(registry.is_active("ash", 0));
        assert!(matches!(
            registry.checkout("ash", 0),
            Err(SessionError::SlotActive { slot: 0, .. })
        ));

        drop(lease);
        assert!(registry.is_empty());
        let _again = registry.checkout("ash", 0).expect("after drop");
    }

    #[test]
    fn slots_are_independent() {
        let registry = Arc::new(SlotRegistry::new());
        let a = registry.checkout("ash", 0).expect("slot 0");
        let b = registry.checkout("ash", 1).expect("slot 1");
        let c = registry.checkout("kai", 0).expect("other user");
        assert_eq!(registry.len(), 3);
        assert_eq!((b.username(), b.slot()), ("ash", 1));
        drop((a, b, c));
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_checkouts_admit_one_holder() {
        let registry = Arc::new(SlotRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.checkout("race", 2).ok())
            })
            .collect();
        let leases: Vec<SlotLease> = handles
            .into_iter()
            .filter_map(|h| h.join().expect("join"))
            .collect();
        // Leases travel back through the join handles, so none is dropped early.
        assert_eq!(leases.len(), 1);
    }
}
