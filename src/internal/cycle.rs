//! Per-producer cyclic dependency detection.
//!
//! Each producer carries a validator until its first successful build. The
//! validator tracks which OS threads are currently inside that producer's
//! construction: the same thread entering twice is the cycle signal, while
//! different threads co-occupying is legal (concurrent independent resolutions
//! of the same type must not be mistaken for a cycle).

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use crate::error::{DiError, DiResult};

/// Thread-set state machine for runtime cycle detection.
///
/// States: Idle → Occupied(thread-set) → back to Idle as threads exit. Entry
/// by a thread already in the set fails with `SelfDependency`; every exit path
/// (success or failure) removes the thread via [`CycleGuard`]'s drop, so a
/// failed build can legitimately be retried by the same thread.
pub(crate) struct CyclicDependencyValidator {
    service: &'static str,
    threads: Mutex<Vec<ThreadId>>,
}

impl CyclicDependencyValidator {
    pub(crate) fn new(service: &'static str) -> Self {
        Self {
            service,
            threads: Mutex::new(Vec::new()),
        }
    }

    /// Marks the current thread as inside this producer's construction.
    ///
    /// Returns a guard that removes the thread again on drop. Fails with
    /// `SelfDependency` when the current thread is already inside.
    pub(crate) fn enter(self: &Arc<Self>) -> DiResult<CycleGuard> {
        let current = thread::current().id();
        let mut threads = self.threads.lock().unwrap();
        if threads.contains(&current) {
            return Err(DiError::SelfDependency(self.service));
        }
        threads.push(current);
        drop(threads);
        Ok(CycleGuard {
            validator: Arc::clone(self),
            thread: current,
        })
    }
}

/// Guaranteed-cleanup region for the validator's thread set.
pub(crate) struct CycleGuard {
    validator: Arc<CyclicDependencyValidator>,
    thread: ThreadId,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        let mut threads = self.validator.threads.lock().unwrap();
        if let Some(pos) = threads.iter().position(|t| *t == self.thread) {
            threads.swap_remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_thread_reentry_is_cycle() {
        let v = Arc::new(CyclicDependencyValidator::new("svc"));
        let _guard = v.enter().unwrap();
        assert_eq!(v.enter().err(), Some(DiError::SelfDependency("svc")));
    }

    #[test]
    fn exit_allows_reentry() {
        let v = Arc::new(CyclicDependencyValidator::new("svc"));
        drop(v.enter().unwrap());
        assert!(v.enter().is_ok());
    }

    #[test]
    fn different_threads_are_not_a_cycle() {
        let v = Arc::new(CyclicDependencyValidator::new("svc"));
        let _guard = v.enter().unwrap();
        let v2 = Arc::clone(&v);
        let handle = thread::spawn(move || v2.enter().map(|_| ()));
        assert!(handle.join().unwrap().is_ok());
    }
}
