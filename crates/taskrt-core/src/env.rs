//! Environment variable utilities
//!
//! Generic `env_get<T>` function for parsing environment variables with
//! defaults. Used for the logging switches and the allocator's
//! line-size override.
//!
//! # Usage
//!
//! ```ignore
//! use taskrt_core::env::{env_get, env_get_bool};
//!
//! let line_size: usize = env_get("TRT_LINE_SIZE", 128);
//! let flush: bool = env_get_bool("TRT_FLUSH_EPRINT", false);
//! ```

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default
///
/// Works with any type that implements `FromStr`. Unset or unparsable
/// values yield the default.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Get environment variable as boolean
///
/// Accepts: "1", "true", "yes", "on" (case-insensitive) as true.
/// Everything else (including unset) returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get environment variable as optional value
///
/// Returns `Some(T)` if the variable is set and parses successfully,
/// `None` otherwise.
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_get_default() {
        // Variable intentionally unset
        let v: usize = env_get("TRT_TEST_UNSET_VARIABLE", 7);
        assert_eq!(v, 7);
    }

    #[test]
    fn test_env_get_set() {
        std::env::set_var("TRT_TEST_SET_VARIABLE", "31");
        let v: usize = env_get("TRT_TEST_SET_VARIABLE", 7);
        assert_eq!(v, 31);
        std::env::remove_var("TRT_TEST_SET_VARIABLE");
    }

    #[test]
    fn test_env_get_bool() {
        std::env::set_var("TRT_TEST_BOOL_VARIABLE", "yes");
        assert!(env_get_bool("TRT_TEST_BOOL_VARIABLE", false));
        std::env::set_var("TRT_TEST_BOOL_VARIABLE", "0");
        assert!(!env_get_bool("TRT_TEST_BOOL_VARIABLE", true));
        std::env::remove_var("TRT_TEST_BOOL_VARIABLE");
    }

    #[test]
    fn test_env_get_opt() {
        let v: Option<u32> = env_get_opt("TRT_TEST_UNSET_VARIABLE");
        assert_eq!(v, None);
    }
}
