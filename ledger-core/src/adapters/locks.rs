//! Per-account lock manager
//!
//! One mutex per account id, created on first use. Callers that need several
//! accounts get their locks in ascending id order, so two units touching the
//! same pair of accounts from opposite directions cannot deadlock.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::AccountId;

#[derive(Debug, Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the locks of every listed account
    ///
    /// Duplicates are ignored. A poisoned account lock is still acquired: the
    /// protected data lives in the store, which rolled back the panicking unit.
    pub fn hold<T>(&self, accounts: &[AccountId], f: impl FnOnce() -> T) -> T {
        let ordered: BTreeSet<AccountId> = accounts.iter().copied().collect();
        let slots: Vec<Arc<Mutex<()>>> = {
            let mut map = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            ordered
                .iter()
                .map(|id| Arc::clone(map.entry(*id).or_default()))
                .collect()
        };

        let _guards: Vec<MutexGuard<'_, ()>> = slots
            .iter()
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        f()
    }

    /// Number of accounts that have been locked at least once
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_duplicates_are_locked_once() {
        let locks = AccountLocks::new();
        let value = locks.hold(&[AccountId(3), AccountId(3), AccountId(1)], || 7);
        assert_eq!(value, 7);
        assert_eq!(locks.tracked(), 2);
    }

    #[test]
    fn test_same_account_is_exclusive() {
        let locks = Arc::new(AccountLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    locks.hold(&[AccountId(1)], || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_opposite_order_does_not_deadlock() {
        let locks = Arc::new(AccountLocks::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [
            [AccountId(1), AccountId(2)],
            [AccountId(2), AccountId(1)],
        ]
        .into_iter()
        .map(|pair| {
            let locks = Arc::clone(&locks);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    locks.hold(&pair, || thread::yield_now());
                }
            })
        })
        .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let locks = Arc::new(AccountLocks::new());
        let cloned = Arc::clone(&locks);
        let _ = thread::spawn(move || {
            cloned.hold(&[AccountId(5)], || panic!("unit panicked"));
        })
        .join();

        assert_eq!(locks.hold(&[AccountId(5)], || "ok"), "ok");
    }
}
