//! Record traffic counters.
//!
//! Lock-free `AtomicU64` counters bumped on the load/save paths and read on
//! dashboard export.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for record store events.
pub struct RecordCounters {
    /// Account records loaded from a stored file.
    pub accounts_loaded: AtomicU64,
    /// Account loads that fell back to the default account file.
    pub account_fallbacks: AtomicU64,
    /// Player records loaded from a stored file.
    pub players_loaded: AtomicU64,
    /// Loads rejected because of a signature mismatch.
    pub header_mismatches: AtomicU64,
    /// Characters created from a class template.
    pub players_created: AtomicU64,
    /// Saves written through to durable storage.
    pub saves_to_filesystem: AtomicU64,
    /// Saves that stopped at the shared cache.
    pub saves_to_cache_only: AtomicU64,
    /// Whole seconds of play time credited to player records.
    pub play_time_seconds_added: AtomicU64,
}

impl RecordCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            accounts_loaded: AtomicU64::new(0),
            account_fallbacks: AtomicU64::new(0),
            players_loaded: AtomicU64::new(0),
            header_mismatches: AtomicU64::new(0),
            players_created: AtomicU64::new(0),
            saves_to_filesystem: AtomicU64::new(0),
            saves_to_cache_only: AtomicU64::new(0),
            play_time_seconds_added: AtomicU64::new(0),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            accounts_loaded: self.accounts_loaded.load(Ordering::Relaxed),
            account_fallbacks: self.account_fallbacks.load(Ordering::Relaxed),
            players_loaded: self.players_loaded.load(Ordering::Relaxed),
            header_mismatches: self.header_mismatches.load(Ordering::Relaxed),
            players_created: self.players_created.load(Ordering::Relaxed),
            saves_to_filesystem: self.saves_to_filesystem.load(Ordering::Relaxed),
            saves_to_cache_only: self.saves_to_cache_only.load(Ordering::Relaxed),
            play_time_seconds_added: self.play_time_seconds_added.load(Ordering::Relaxed),
        }
    }
}

impl Default for RecordCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecordCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.snapshot().fmt(f)
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Account records loaded from a stored file.
    pub accounts_loaded: u64,
    /// Account loads that fell back to the default file.
    pub account_fallbacks: u64,
    /// Player records loaded from a stored file.
    pub players_loaded: u64,
    /// Signature mismatches seen on load.
    pub header_mismatches: u64,
    /// Characters created from templates.
    pub players_created: u64,
    /// Saves written to durable storage.
    pub saves_to_filesystem: u64,
    /// Saves kept in the cache only.
    pub saves_to_cache_only: u64,
    /// Play-time seconds credited.
    pub play_time_seconds_added: u64,
}
