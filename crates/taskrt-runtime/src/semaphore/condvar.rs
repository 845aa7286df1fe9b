//! Fallback semaphores using std::sync::Condvar
//!
//! Used on platforms without futex support. Both variants guard their
//! value with a private mutex+condvar pair and wake with `notify_one`,
//! never a broadcast. A poisoned mutex means a thread panicked inside a
//! wait or a wake; a synchronization primitive in that state cannot be
//! routed around, so the unwrap is fatal by design.

use std::sync::{Condvar, Mutex};

/// Counting semaphore on mutex+condvar
pub(super) struct Semaphore {
    count: Mutex<u32>,
    cond: Condvar,
}

impl Semaphore {
    pub(super) fn new(initial: u32) -> Self {
        Semaphore {
            count: Mutex::new(initial),
            cond: Condvar::new(),
        }
    }

    pub(super) fn acquire(&self) {
        let mut count = self.count.lock().unwrap();
        // Predicate-guarded wait: re-check on every wakeup
        while *count == 0 {
            count = self.cond.wait(count).unwrap();
        }
        *count -= 1;
    }

    pub(super) fn release(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.cond.notify_one();
    }
}

/// Binary semaphore on mutex+condvar
pub(super) struct BinarySemaphore {
    set: Mutex<bool>,
    cond: Condvar,
}

impl BinarySemaphore {
    pub(super) fn new() -> Self {
        BinarySemaphore {
            set: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    pub(super) fn acquire(&self) {
        let mut set = self.set.lock().unwrap();
        while !*set {
            set = self.cond.wait(set).unwrap();
        }
        // Auto-clear on consumption
        *set = false;
    }

    pub(super) fn release(&self) {
        let mut set = self.set.lock().unwrap();
        *set = true;
        self.cond.notify_one();
    }
}
