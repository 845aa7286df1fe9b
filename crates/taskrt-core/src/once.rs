//! One-time initialization flag
//!
//! Guarantees a setup routine runs exactly once across arbitrarily many
//! concurrent callers, with the routine's effects visible to every
//! caller before it proceeds. Used by the allocator facade for its lazy
//! backend binding.

use core::sync::atomic::{AtomicU8, Ordering};

/// Flag states, transition monotonically forward only.
const UNINITIALIZED: u8 = 0;
const EXECUTING: u8 = 1;
const EXECUTED: u8 = 2;

/// A one-shot initialization flag.
///
/// The first caller to reach [`run_once`](Self::run_once) claims the
/// flag and runs the setup routine; every other concurrent caller waits
/// until the routine has finished, then returns without running it.
/// Completion is published with release ordering, so writes performed
/// by the setup routine are visible to every caller that returns.
///
/// The setup routine must not fail: there is no poisoning or retry
/// path. A routine that panics leaves the flag permanently claimed and
/// later callers wait forever, so a failing setup is a fatal process
/// error by design.
///
/// # Example
///
/// ```ignore
/// static INIT: OnceFlag = OnceFlag::new();
///
/// INIT.run_once(|| bind_backend());
/// // The backend is bound and visible from here on, on every thread.
/// ```
pub struct OnceFlag {
    state: AtomicU8,
}

impl OnceFlag {
    /// Create a new flag in the uninitialized state
    #[inline]
    pub const fn new() -> Self {
        OnceFlag {
            state: AtomicU8::new(UNINITIALIZED),
        }
    }

    /// Check whether the setup routine has completed
    ///
    /// Never blocks. A `true` result carries acquire ordering: the
    /// setup routine's writes are visible to the caller.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.state.load(Ordering::Acquire) == EXECUTED
    }

    /// Run `setup` exactly once across all callers
    ///
    /// Returns only after the setup routine has completed, whether it
    /// ran on this thread or another.
    #[inline]
    pub fn run_once<F: FnOnce()>(&self, setup: F) {
        if self.is_done() {
            return;
        }
        self.run_once_slow(setup);
    }

    #[cold]
    fn run_once_slow<F: FnOnce()>(&self, setup: F) {
        match self.state.compare_exchange(
            UNINITIALIZED,
            EXECUTING,
            Ordering::Acquire,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                setup();
                self.state.store(EXECUTED, Ordering::Release);
            }
            Err(_) => {
                // Lost the claim; wait for the winner to finish.
                // Spin with backoff, then start yielding the thread.
                let mut spin_count = 0u32;
                while self.state.load(Ordering::Acquire) != EXECUTED {
                    spin_count = spin_count.wrapping_add(1);
                    for _ in 0..spin_count.min(64) {
                        core::hint::spin_loop();
                    }
                    if spin_count > 64 {
                        std::thread::yield_now();
                    }
                }
            }
        }
    }
}

impl Default for OnceFlag {
    fn default() -> Self {
        OnceFlag::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_runs_exactly_once() {
        let flag = OnceFlag::new();
        let count = AtomicUsize::new(0);

        for _ in 0..5 {
            flag.run_once(|| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(flag.is_done());
    }

    #[test]
    fn test_not_done_before_first_call() {
        let flag = OnceFlag::new();
        assert!(!flag.is_done());
    }

    #[test]
    fn test_concurrent_callers() {
        let flag = Arc::new(OnceFlag::new());
        let count = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..8 {
            let flag = Arc::clone(&flag);
            let count = Arc::clone(&count);
            handles.push(thread::spawn(move || {
                flag.run_once(|| {
                    // Make the race window wide enough to matter
                    thread::sleep(std::time::Duration::from_millis(10));
                    count.fetch_add(1, Ordering::SeqCst);
                });
                // Every caller must observe the completed setup
                assert_eq!(count.load(Ordering::SeqCst), 1);
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_effects_visible_after_return() {
        let flag = Arc::new(OnceFlag::new());
        let value = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..4 {
            let flag = Arc::clone(&flag);
            let value = Arc::clone(&value);
            handles.push(thread::spawn(move || {
                flag.run_once(|| {
                    value.store(42, Ordering::Relaxed);
                });
                // run_once returned, so the setup's write is visible
                assert_eq!(value.load(Ordering::Relaxed), 42);
            }));
        }

        for h in handles {
            h.join().unwrap();
        }
    }
}
