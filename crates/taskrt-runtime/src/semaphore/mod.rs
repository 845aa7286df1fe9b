//! Blocking semaphores for thread park/wake
//!
//! Counting and binary variants as distinct types with no shared state:
//! the counting semaphore is a resource counter, the binary one a
//! single-pending-signal flag with a cheaper fast path.
//!
//! One implementation per platform: a futex word on Linux, mutex plus
//! condvar elsewhere. Neither variant supports timeouts or
//! cancellation; `acquire` blocks until a matching `release`.

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod futex_linux;
        use futex_linux as imp;
    } else {
        mod condvar;
        use condvar as imp;
    }
}

/// Counting semaphore
///
/// `acquire` blocks while the count is zero, then decrements it;
/// `release` increments the count and wakes at most one waiter (never a
/// broadcast). Any thread may release, regardless of which threads
/// acquired: this is a resource counter, not a reentrant lock.
///
/// The count can never go negative; a negative initial count is
/// unrepresentable by construction.
///
/// # Example
///
/// ```ignore
/// let sem = Semaphore::new(2);
/// sem.acquire(); // immediate
/// sem.acquire(); // immediate
/// // a third acquire would block until someone calls sem.release()
/// ```
pub struct Semaphore {
    inner: imp::Semaphore,
}

impl Semaphore {
    /// Create a semaphore holding `initial` permits
    pub fn new(initial: u32) -> Self {
        Semaphore {
            inner: imp::Semaphore::new(initial),
        }
    }

    /// Block until a permit is available, then take it
    ///
    /// Spurious wakeups are absorbed internally; returning means a
    /// permit was taken.
    pub fn acquire(&self) {
        self.inner.acquire();
    }

    /// Add a permit, waking at most one blocked waiter
    ///
    /// Never blocks.
    pub fn release(&self) {
        self.inner.release();
    }
}

/// Binary semaphore
///
/// A single signaled flag, auto-cleared by `acquire`. Releases with no
/// intervening acquire coalesce: the flag holds at most one pending
/// signal, no count accumulates. Chosen over [`Semaphore`] where only a
/// single outstanding wake is ever meaningful.
pub struct BinarySemaphore {
    inner: imp::BinarySemaphore,
}

impl BinarySemaphore {
    /// Create an unsignaled binary semaphore
    pub fn new() -> Self {
        BinarySemaphore {
            inner: imp::BinarySemaphore::new(),
        }
    }

    /// Block until signaled, clearing the signal on return
    pub fn acquire(&self) {
        self.inner.acquire();
    }

    /// Signal, waking at most one blocked waiter
    ///
    /// Idempotent while the signal is pending.
    pub fn release(&self) {
        self.inner.release();
    }
}

impl Default for BinarySemaphore {
    fn default() -> Self {
        BinarySemaphore::new()
    }
}
