//! # taskrt-core
//!
//! Core bootstrap primitives for the taskrt parallel runtime.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! Platform-specific pieces (allocator backends, futex waits, provider
//! plumbing) live in `taskrt-runtime`.
//!
//! ## Modules
//!
//! - `once` - One-time initialization flag
//! - `error` - Error types
//! - `env` - Environment variable utilities
//! - `kprint` - Kernel-style debug printing macros

pub mod env;
pub mod error;
pub mod kprint;
pub mod once;

// Re-exports for convenience
pub use env::{env_get, env_get_bool, env_get_opt};
pub use error::{RtError, RtResult};
pub use once::OnceFlag;

/// Constants shared across the runtime layer
pub mod constants {
    /// Default padded-allocation line size in bytes.
    ///
    /// Matches a typical hardware cache line pair, so padded blocks on
    /// adjacent addresses never share a line.
    pub const DEFAULT_LINE_SIZE: usize = 128;

    /// Upper bound for a configured line size.
    pub const MAX_LINE_SIZE: usize = 4096;
}
