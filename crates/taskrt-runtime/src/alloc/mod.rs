//! Cache-aligned allocation facade
//!
//! Exposes aligned and unaligned allocate/free entry points that bind
//! themselves to a backend exactly once, on first use: the scalable
//! allocator when its entry points are present in the process image,
//! the platform malloc otherwise. After binding, every call goes
//! straight to the bound backend with no locking.
//!
//! Consumers must not call a backend directly; blocks from the aligned
//! path must be returned through [`free`], blocks from the raw path
//! through [`deallocate_via_handler`].

mod scalable;

use core::cell::UnsafeCell;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicUsize, Ordering};

use taskrt_core::constants::{DEFAULT_LINE_SIZE, MAX_LINE_SIZE};
use taskrt_core::env::env_get_opt;
use taskrt_core::error::{RtError, RtResult};
use taskrt_core::once::OnceFlag;
use taskrt_core::{kinfo, kwarn};

use scalable::ScalableBackend;

/// Smallest accepted line size: posix_memalign requires a multiple of
/// the pointer size.
const MIN_LINE_SIZE: usize = core::mem::size_of::<usize>();

/// The allocation backend bound behind the facade.
pub(crate) enum Backend {
    /// Scalable allocator discovered in the process image
    Scalable(ScalableBackend),

    /// Platform malloc
    Fallback,
}

impl Backend {
    fn raw_allocate(&self, size: usize) -> *mut u8 {
        match self {
            // Safety: entry point resolved by `scalable::resolve`, same
            // signature as declared there.
            Backend::Scalable(s) => unsafe { (s.malloc)(size).cast() },
            Backend::Fallback => unsafe { libc::malloc(size).cast() },
        }
    }

    fn raw_free(&self, p: *mut u8) {
        match self {
            // Safety: `p` came from this backend's raw_allocate.
            Backend::Scalable(s) => unsafe { (s.free)(p.cast()) },
            Backend::Fallback => unsafe { libc::free(p.cast()) },
        }
    }

    fn padded_allocate(&self, bytes: usize, alignment: usize) -> *mut u8 {
        match self {
            // Safety: entry point resolved by `scalable::resolve`.
            Backend::Scalable(s) => unsafe { (s.aligned_malloc)(bytes, alignment).cast() },
            Backend::Fallback => fallback_padded_allocate(bytes, alignment),
        }
    }

    fn padded_free(&self, p: *mut u8) {
        match self {
            // Safety: `p` came from this backend's padded_allocate.
            Backend::Scalable(s) => unsafe { (s.aligned_free)(p.cast()) },
            Backend::Fallback => fallback_padded_free(p),
        }
    }

    fn is_scalable(&self) -> bool {
        matches!(self, Backend::Scalable(_))
    }

    fn name(&self) -> &'static str {
        match self {
            Backend::Scalable(_) => "scalable_malloc",
            Backend::Fallback => "malloc",
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn fallback_padded_allocate(bytes: usize, alignment: usize) -> *mut u8 {
            let mut out: *mut libc::c_void = ptr::null_mut();
            let rc = unsafe { libc::posix_memalign(&mut out, alignment, bytes) };
            if rc != 0 {
                return ptr::null_mut();
            }
            out.cast()
        }

        fn fallback_padded_free(p: *mut u8) {
            unsafe { libc::free(p.cast()) }
        }
    } else {
        // No aligned allocator with a plain free on this platform:
        // over-allocate and stash the unaligned base just below the
        // block handed out.
        fn fallback_padded_allocate(bytes: usize, alignment: usize) -> *mut u8 {
            let overhead = alignment + core::mem::size_of::<*mut u8>();
            let total = match bytes.checked_add(overhead) {
                Some(t) => t,
                None => return ptr::null_mut(),
            };
            let base: *mut u8 = unsafe { libc::malloc(total) }.cast();
            if base.is_null() {
                return ptr::null_mut();
            }
            let addr = base as usize + core::mem::size_of::<*mut u8>();
            let aligned = (addr + alignment - 1) & !(alignment - 1);
            // Safety: `aligned` is at least one pointer past `base` and
            // within the allocation.
            unsafe { (aligned as *mut *mut u8).sub(1).write(base) };
            aligned as *mut u8
        }

        fn fallback_padded_free(p: *mut u8) {
            // Safety: `p` was produced by fallback_padded_allocate,
            // which stored the malloc base one pointer below it.
            unsafe {
                let base = (p as *mut *mut u8).sub(1).read();
                libc::free(base.cast());
            }
        }
    }
}

/// Process-wide facade state: the backend slot is written exactly once
/// by whichever thread wins the once flag, and read-only thereafter.
struct FacadeState {
    once: OnceFlag,
    backend: UnsafeCell<Option<Backend>>,
    line_size: AtomicUsize,
    bind_calls: AtomicUsize,
}

// Safety: `backend` is written only inside `once.run_once` and read
// only after the flag reports done, so all access is ordered.
unsafe impl Sync for FacadeState {}

static FACADE: FacadeState = FacadeState {
    once: OnceFlag::new(),
    backend: UnsafeCell::new(None),
    line_size: AtomicUsize::new(DEFAULT_LINE_SIZE),
    bind_calls: AtomicUsize::new(0),
};

fn resolve_line_size() -> usize {
    match env_get_opt::<usize>("TRT_LINE_SIZE") {
        Some(line)
            if line.is_power_of_two() && (MIN_LINE_SIZE..=MAX_LINE_SIZE).contains(&line) =>
        {
            line
        }
        Some(line) => {
            kwarn!(
                "TRT_LINE_SIZE={} rejected, want a power of two in {}..={}",
                line,
                MIN_LINE_SIZE,
                MAX_LINE_SIZE
            );
            DEFAULT_LINE_SIZE
        }
        None => DEFAULT_LINE_SIZE,
    }
}

/// Runs under the once flag; never called twice.
fn bind_backend() {
    FACADE.bind_calls.fetch_add(1, Ordering::Relaxed);
    FACADE
        .line_size
        .store(resolve_line_size(), Ordering::Relaxed);

    let backend = match scalable::resolve() {
        Some(s) => Backend::Scalable(s),
        None => Backend::Fallback,
    };
    kinfo!("allocator backend: {}", backend.name());

    // Safety: only the thread that claimed the once flag writes the
    // slot, and no reader looks before the flag reports done.
    unsafe { *FACADE.backend.get() = Some(backend) };
}

/// Bind on first use, then hand out the bound backend.
#[inline]
fn backend() -> &'static Backend {
    FACADE.once.run_once(bind_backend);
    // Safety: run_once returned, so bind_backend's write is complete
    // and visible; the slot is never written again.
    unsafe { (*FACADE.backend.get()).as_ref().expect("allocator backend bound") }
}

/// How many times the backend-binding routine has run in this process.
/// Stays at 1 after first use, regardless of thread count.
pub(crate) fn binding_count() -> usize {
    FACADE.bind_calls.load(Ordering::Relaxed)
}

/// The line size padded allocations are aligned to
///
/// Forces backend binding so the value is final. Always a power of two
/// no larger than [`MAX_LINE_SIZE`].
pub fn line_size() -> usize {
    backend();
    FACADE.line_size.load(Ordering::Relaxed)
}

/// Allocate `count * element_size` bytes aligned to [`line_size`]
///
/// Any overflow in the size computation, including the padding the
/// backend may add for alignment, fails with `BadAlloc` before touching
/// the backend. A zero-byte request is treated as one byte, since the
/// aligned backend rejects empty requests.
pub fn allocate(count: usize, element_size: usize) -> RtResult<NonNull<u8>> {
    let backend = backend();
    let line = FACADE.line_size.load(Ordering::Relaxed);
    debug_assert!(line.is_power_of_two() && line <= MAX_LINE_SIZE);

    let bytes = count.checked_mul(element_size).ok_or(RtError::BadAlloc)?;
    bytes.checked_add(line).ok_or(RtError::BadAlloc)?;
    let bytes = if bytes == 0 { 1 } else { bytes };

    let result = NonNull::new(backend.padded_allocate(bytes, line)).ok_or(RtError::BadAlloc)?;
    debug_assert_eq!(
        result.as_ptr() as usize % line,
        0,
        "backend returned a misaligned block"
    );
    Ok(result)
}

/// Free a block obtained from [`allocate`]
///
/// Null is a no-op.
pub fn free(p: *mut u8) {
    if p.is_null() {
        return;
    }
    backend().padded_free(p);
}

/// Allocate `n` bytes through the raw backend path
///
/// No alignment guarantee beyond the backend's own. Fails with
/// `BadAlloc` when the backend returns null.
pub fn allocate_via_handler(n: usize) -> RtResult<NonNull<u8>> {
    NonNull::new(backend().raw_allocate(n)).ok_or(RtError::BadAlloc)
}

/// Free a block obtained from [`allocate_via_handler`]
///
/// Null is a no-op.
pub fn deallocate_via_handler(p: *mut u8) {
    if p.is_null() {
        return;
    }
    backend().raw_free(p);
}

/// Whether the scalable backend (rather than plain malloc) is bound
///
/// Forces backend binding if it has not happened yet.
pub fn is_backend_scalable() -> bool {
    backend().is_scalable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_allocate_is_aligned() {
        let line = line_size();
        for count in [1usize, 3, 17, 1000] {
            let p = allocate(count, 8).unwrap();
            assert_eq!(p.as_ptr() as usize % line, 0);
            // The block is writable over its full length
            unsafe { ptr::write_bytes(p.as_ptr(), 0xAB, count * 8) };
            free(p.as_ptr());
        }
    }

    #[test]
    fn test_allocate_zero_bytes() {
        let line = line_size();
        let p = allocate(0, 8).unwrap();
        assert_eq!(p.as_ptr() as usize % line, 0);
        free(p.as_ptr());

        let p = allocate(8, 0).unwrap();
        free(p.as_ptr());
    }

    #[test]
    fn test_allocate_multiplication_overflow() {
        assert_eq!(allocate(usize::MAX, 2), Err(RtError::BadAlloc));
        assert_eq!(allocate(usize::MAX / 2 + 1, 2), Err(RtError::BadAlloc));
    }

    #[test]
    fn test_allocate_padding_overflow() {
        // Product fits, product + line size does not
        assert_eq!(allocate(usize::MAX, 1), Err(RtError::BadAlloc));
    }

    #[test]
    fn test_free_null_is_noop() {
        free(ptr::null_mut());
        deallocate_via_handler(ptr::null_mut());
    }

    #[test]
    fn test_via_handler_roundtrip() {
        let p = allocate_via_handler(64).unwrap();
        unsafe { ptr::write_bytes(p.as_ptr(), 0xCD, 64) };
        deallocate_via_handler(p.as_ptr());
    }

    #[test]
    fn test_backend_identity_is_stable() {
        let first = is_backend_scalable();
        for _ in 0..4 {
            assert_eq!(is_backend_scalable(), first);
        }
    }

    #[test]
    fn test_concurrent_first_use_binds_once() {
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let mut handles = vec![];

        for _ in 0..8 {
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                let p = allocate(16, 16).unwrap();
                assert_eq!(p.as_ptr() as usize % line_size(), 0);
                free(p.as_ptr());
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        // Other tests may already have bound the backend; either way
        // the binding routine must have run exactly once.
        assert_eq!(binding_count(), 1);
    }

    #[test]
    fn test_line_size_bounds() {
        let line = line_size();
        assert!(line.is_power_of_two());
        assert!(line <= MAX_LINE_SIZE);
    }
}
