//! Extension trait to ignore mutex poisoning.
//!
//! The listing cache, the access counter and the watch set all guard plain maps whose
//! contents stay consistent even if a holder panics mid-request, so a poisoned lock is
//! recovered instead of propagated.

use std::sync::{Mutex, MutexGuard};

pub trait IgnorePoison<T> {
    /// Locks the mutex, recovering the guard if another thread panicked while holding it.
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> IgnorePoison<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_lock_recovers_after_panic() {
        let shared = Arc::new(Mutex::new(vec![1, 2]));
        let clone = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = clone.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(shared.is_poisoned());
        shared.lock_ignore_poison().push(3);
        assert_eq!(*shared.lock_ignore_poison(), vec![1, 2, 3]);
    }
}
