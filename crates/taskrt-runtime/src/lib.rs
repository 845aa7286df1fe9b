//! # taskrt-runtime
//!
//! Platform-specific layer of the taskrt parallel runtime.
//!
//! This crate provides:
//! - Cache-aligned allocation facade with lazy backend binding
//! - Counting and binary semaphores (futex on Linux, condvar fallback)
//! - Runtime provider factory and registry

pub mod alloc;
pub mod factory;
pub mod semaphore;

// Re-exports
pub use alloc::{
    allocate, allocate_via_handler, deallocate_via_handler, free, is_backend_scalable, line_size,
};
pub use factory::{
    register_provider, FactoryStatus, RuntimeClient, RuntimeFactory, RuntimeProvider,
    RuntimeServer, ServerInfo, CLIENT_VERSION,
};
pub use semaphore::{BinarySemaphore, Semaphore};
