//! Scalable backend discovery
//!
//! The scalable allocator ships as a separate library; when a process
//! has it loaded, its four entry points are visible through the dynamic
//! linker. Resolution is all-or-nothing: a partial symbol set means the
//! fallback is used instead.

use libc::c_void;

/// Entry points of a discovered scalable allocator.
pub(crate) struct ScalableBackend {
    pub(crate) malloc: unsafe extern "C" fn(usize) -> *mut c_void,
    pub(crate) free: unsafe extern "C" fn(*mut c_void),
    pub(crate) aligned_malloc: unsafe extern "C" fn(usize, usize) -> *mut c_void,
    pub(crate) aligned_free: unsafe extern "C" fn(*mut c_void),
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn lookup(name: &'static str) -> *mut c_void {
            debug_assert!(name.ends_with('\0'));
            unsafe { libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr().cast()) }
        }

        /// Resolve the scalable entry points from the process image.
        pub(crate) fn resolve() -> Option<ScalableBackend> {
            let malloc = lookup("scalable_malloc\0");
            let free = lookup("scalable_free\0");
            let aligned_malloc = lookup("scalable_aligned_malloc\0");
            let aligned_free = lookup("scalable_aligned_free\0");

            if malloc.is_null()
                || free.is_null()
                || aligned_malloc.is_null()
                || aligned_free.is_null()
            {
                return None;
            }

            // Safety: non-null symbols exported under these names carry
            // the C allocator signatures declared above.
            unsafe {
                Some(ScalableBackend {
                    malloc: core::mem::transmute::<
                        *mut c_void,
                        unsafe extern "C" fn(usize) -> *mut c_void,
                    >(malloc),
                    free: core::mem::transmute::<*mut c_void, unsafe extern "C" fn(*mut c_void)>(
                        free,
                    ),
                    aligned_malloc: core::mem::transmute::<
                        *mut c_void,
                        unsafe extern "C" fn(usize, usize) -> *mut c_void,
                    >(aligned_malloc),
                    aligned_free: core::mem::transmute::<
                        *mut c_void,
                        unsafe extern "C" fn(*mut c_void),
                    >(aligned_free),
                })
            }
        }
    } else {
        /// No dynamic symbol lookup on this platform; always fall back.
        pub(crate) fn resolve() -> Option<ScalableBackend> {
            None
        }
    }
}
