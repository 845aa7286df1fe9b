//! Linux futex-based semaphores
//!
//! The count (or flag) doubles as the futex word. Waiters sleep with
//! FUTEX_WAIT against an observed value of zero; any release bumps the
//! word and wakes one waiter. EAGAIN (word changed before sleeping) and
//! EINTR both re-enter the predicate loop, so spurious returns are
//! harmless.

use std::sync::atomic::{AtomicU32, Ordering};

fn futex_wait(word: &AtomicU32, expected: u32) {
    // Sleeps only while *word == expected; errors (EAGAIN, EINTR,
    // ETIMEDOUT never occurs without a timeout) are re-checked by the
    // caller's loop.
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
            expected,
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        );
    }
}

fn futex_wake_one(word: &AtomicU32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
            1i32,
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        );
    }
}

/// Counting semaphore on a single futex word
pub(super) struct Semaphore {
    count: AtomicU32,
}

impl Semaphore {
    pub(super) fn new(initial: u32) -> Self {
        Semaphore {
            count: AtomicU32::new(initial),
        }
    }

    pub(super) fn acquire(&self) {
        loop {
            let current = self.count.load(Ordering::Acquire);
            if current > 0 {
                if self
                    .count
                    .compare_exchange_weak(
                        current,
                        current - 1,
                        Ordering::Acquire,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    return;
                }
                continue;
            }
            // Sleep only if the count is still zero when the kernel
            // looks; a racing release makes this return immediately.
            futex_wait(&self.count, 0);
        }
    }

    pub(super) fn release(&self) {
        self.count.fetch_add(1, Ordering::Release);
        futex_wake_one(&self.count);
    }
}

/// Binary semaphore on a single futex word: 0 = unset, 1 = set
pub(super) struct BinarySemaphore {
    flag: AtomicU32,
}

impl BinarySemaphore {
    pub(super) fn new() -> Self {
        BinarySemaphore {
            flag: AtomicU32::new(0),
        }
    }

    pub(super) fn acquire(&self) {
        loop {
            // Consume the signal if present, clearing it
            if self.flag.swap(0, Ordering::Acquire) == 1 {
                return;
            }
            futex_wait(&self.flag, 0);
        }
    }

    pub(super) fn release(&self) {
        // Repeated releases keep the flag at 1; only the transition
        // from unset needs a wake
        if self.flag.swap(1, Ordering::Release) == 0 {
            futex_wake_one(&self.flag);
        }
    }
}
