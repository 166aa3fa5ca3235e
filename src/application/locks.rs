use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-account mutual exclusion for transfer commits.
///
/// Each account id maps to a lazily created `tokio::sync::Mutex` handle.
/// `lock_pair` always acquires the lower id first, so two transfers touching
/// the same pair of accounts in opposite directions cannot deadlock.
#[derive(Default)]
pub struct AccountLocks {
    table: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

/// Guards for both accounts of a transfer. Released on drop.
pub struct PairGuard {
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks both accounts, lower id first. Equal ids take a single guard.
    pub async fn lock_pair(&self, a: u64, b: u64) -> PairGuard {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (lo_handle, hi_handle) = {
            let mut table = self.table.lock().await;
            let lo_handle = Arc::clone(table.entry(lo).or_default());
            let hi_handle = Arc::clone(table.entry(hi).or_default());
            (lo_handle, hi_handle)
        };

        let first = lo_handle.lock_owned().await;
        let second = if lo == hi {
            None
        } else {
            Some(hi_handle.lock_owned().await)
        };
        PairGuard {
            _first: first,
            _second: second,
        }
    }
}
