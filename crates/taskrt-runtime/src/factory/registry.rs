//! Compiled-in provider registry
//!
//! Process-wide table of runtime providers keyed by flavor name.
//! A backend registers itself (or is registered by the host) before any
//! factory of its flavor opens. Registration after that point only
//! affects factories opened later.

use std::sync::{Arc, Mutex};

use super::RuntimeProvider;

static REGISTRY: Mutex<Vec<Arc<dyn RuntimeProvider>>> = Mutex::new(Vec::new());

/// Register a runtime provider under its flavor name
///
/// A later registration for the same flavor replaces the earlier one;
/// factories already open keep the provider they bound.
pub fn register_provider(provider: Arc<dyn RuntimeProvider>) {
    let mut table = REGISTRY.lock().unwrap();
    table.retain(|p| p.flavor() != provider.flavor());
    table.push(provider);
}

/// Find the provider registered under `flavor`
pub(crate) fn lookup(flavor: &str) -> Option<Arc<dyn RuntimeProvider>> {
    let table = REGISTRY.lock().unwrap();
    table.iter().find(|p| p.flavor() == flavor).cloned()
}
