//! # taskrt - Parallel Runtime Support Library
//!
//! Bootstrap layer for a parallel runtime: the pieces every other
//! runtime component leans on before any explicit setup call happens.
//!
//! ## What's here
//!
//! - **Cache-aligned allocation facade** - [`allocate`] / [`free`] hand
//!   out line-aligned blocks (no false sharing between adjacent
//!   allocations) and bind themselves to a backend exactly once, on
//!   first use: the scalable allocator when present in the process,
//!   plain malloc otherwise. Safe under concurrent first use from any
//!   number of threads.
//! - **Blocking semaphores** - [`Semaphore`] (counting) and
//!   [`BinarySemaphore`] (single pending signal), futex-backed on Linux
//!   with a portable condvar fallback.
//! - **Runtime provider factory** - [`RuntimeFactory`] negotiates a
//!   versioned handshake with a registered threading backend and yields
//!   the capability to create server objects.
//! - **One-time initialization** - [`OnceFlag`], the primitive behind
//!   the facade's lazy binding.
//!
//! ## Quick Start
//!
//! ```ignore
//! use taskrt::{allocate, free, Semaphore};
//!
//! // Cache-line-aligned storage for 1024 counters
//! let block = allocate(1024, 8)?;
//! assert_eq!(block.as_ptr() as usize % taskrt::line_size(), 0);
//! free(block.as_ptr());
//!
//! // Bounded admission across worker threads
//! let permits = Semaphore::new(4);
//! permits.acquire();
//! // ... critical work ...
//! permits.release();
//! ```
//!
//! ## Layering
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │         scheduler / task layers (separate)   │
//! └──────────────────────────────────────────────┘
//!                  │ allocate, park, make_server
//!                  ▼
//! ┌──────────────────────────────────────────────┐
//! │ taskrt-runtime: alloc facade, semaphores,    │
//! │                 provider factory             │
//! └──────────────────────────────────────────────┘
//!                  │ run_once, errors, kprint
//!                  ▼
//! ┌──────────────────────────────────────────────┐
//! │ taskrt-core: OnceFlag, RtError, env, logging │
//! └──────────────────────────────────────────────┘
//! ```

pub use taskrt_core::error::{RtError, RtResult};
pub use taskrt_core::kprint::{self, LogLevel};
pub use taskrt_core::once::OnceFlag;
pub use taskrt_core::{kdebug, kerror, kinfo, kprintln, kwarn};

pub use taskrt_runtime::{
    allocate, allocate_via_handler, deallocate_via_handler, free, is_backend_scalable, line_size,
    register_provider, BinarySemaphore, FactoryStatus, RuntimeClient, RuntimeFactory,
    RuntimeProvider, RuntimeServer, Semaphore, ServerInfo, CLIENT_VERSION,
};
