//! Runtime provider factory
//!
//! A versioned handshake for acquiring a threading-runtime backend.
//! Providers are ordinary Rust values registered in a process-wide
//! registry under a flavor name; a factory opens against one of them,
//! negotiates a protocol version, and from then on carries the
//! capability to create server objects and query runtime information.
//!
//! The factory records the negotiated version but never interprets it;
//! compatibility policy lives with the provider (see
//! [`RuntimeProvider::open`]).
//!
//! Open and close are expected to be serialized by the caller (one
//! controlling thread during setup and teardown); `make_server` and
//! `call_with_server_info` may be called concurrently once open,
//! contingent on the provider's own thread-safety.

mod registry;

pub use registry::register_provider;

use std::sync::Arc;

use taskrt_core::error::{RtError, RtResult};

/// Protocol version this client generation speaks.
pub const CLIENT_VERSION: u32 = 2;

/// Status codes of the provider handshake
///
/// Surfaced to the caller unchanged; everything except `Success` is an
/// open failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryStatus {
    /// Handshake completed, factory is open
    Success,

    /// No provider registered under the requested flavor
    NotFound,

    /// Provider rejected the client's protocol version
    IncompatibleVersion,

    /// Factory was not in a state that permits the operation
    InvalidState,
}

impl FactoryStatus {
    /// `Result` view of a handshake status
    pub fn into_result(self) -> RtResult<()> {
        match self {
            FactoryStatus::Success => Ok(()),
            _ => Err(RtError::OpenFailed),
        }
    }
}

/// Descriptive information a provider reports about its runtime
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Flavor the provider registered under
    pub flavor: &'static str,

    /// Protocol version the server speaks
    pub server_version: u32,

    /// Human-readable description (build, thread count, ...)
    pub description: String,
}

/// Client capability descriptor handed to [`RuntimeFactory::make_server`]
///
/// Describes what the caller wants from a server; the provider treats
/// it opaquely beyond these bounds.
pub trait RuntimeClient: Send + Sync {
    /// Most worker threads the client can put to use
    fn max_job_count(&self) -> usize;

    /// Smallest stack the client's jobs can run on, in bytes
    fn min_stack_size(&self) -> usize;
}

/// Opaque server handle returned by [`RuntimeFactory::make_server`]
pub trait RuntimeServer: Send + Sync {
    /// Protocol version this server object speaks
    fn version(&self) -> u32;
}

/// A threading-runtime backend discoverable through the registry
///
/// Version policy: a provider advertises a minimum supported client
/// version and its own server version. [`open`](Self::open) must fail
/// with `IncompatibleVersion` when `client_version` is below the
/// minimum, and otherwise return the negotiated version
/// `min(server_version, client_version)`.
pub trait RuntimeProvider: Send + Sync {
    /// Flavor name the provider registers under
    fn flavor(&self) -> &'static str;

    /// Handshake: negotiate with `client_version`
    ///
    /// Returns the version the server will speak, or the rejection
    /// status.
    fn open(&self, client_version: u32) -> Result<u32, FactoryStatus>;

    /// Release resources tied to a factory binding
    ///
    /// Called exactly once per successful `open`.
    fn close(&self);

    /// Create a server object for `client`
    fn make_server(
        &self,
        client: Arc<dyn RuntimeClient>,
    ) -> Result<Box<dyn RuntimeServer>, FactoryStatus>;

    /// Invoke `callback` synchronously with runtime information
    fn call_with_server_info(&self, callback: &mut dyn FnMut(&ServerInfo));
}

/// Handle on a (potential) runtime provider binding
///
/// Starts closed; [`open`](Self::open) binds it to the registered
/// provider of its flavor, [`close`](Self::close) releases the binding.
/// A factory is opened at most once for its lifetime.
pub struct RuntimeFactory {
    flavor: &'static str,
    provider: Option<Arc<dyn RuntimeProvider>>,
    server_version: u32,
    opened: bool,
}

impl RuntimeFactory {
    /// Create a closed factory for the given provider flavor
    pub const fn new(flavor: &'static str) -> Self {
        RuntimeFactory {
            flavor,
            provider: None,
            server_version: 0,
            opened: false,
        }
    }

    /// Open the factory against its flavor's registered provider
    ///
    /// On success the negotiated server version is recorded and the
    /// provider is bound until [`close`](Self::close). Opening a
    /// factory that was ever opened before is a programming error:
    /// asserted in debug builds, reported as `InvalidState` otherwise.
    pub fn open(&mut self) -> FactoryStatus {
        debug_assert!(!self.opened, "factory already opened");
        if self.opened {
            return FactoryStatus::InvalidState;
        }

        let provider = match registry::lookup(self.flavor) {
            Some(p) => p,
            None => return FactoryStatus::NotFound,
        };

        match provider.open(CLIENT_VERSION) {
            Ok(negotiated) => {
                self.server_version = negotiated;
                self.provider = Some(provider);
                self.opened = true;
                FactoryStatus::Success
            }
            Err(status) => status,
        }
    }

    /// Release the provider binding
    ///
    /// Invokes the provider's release hook if a prior `open` succeeded;
    /// a never-opened factory closes as a safe no-op. The hook runs at
    /// most once however often `close` is called.
    pub fn close(&mut self) {
        if let Some(provider) = self.provider.take() {
            provider.close();
        }
    }

    /// Create a server object for `client`
    ///
    /// Delegates to the bound provider; the provider's status passes
    /// through unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the factory is not open. Calling `make_server` before
    /// a successful `open` is a programming error, not a recoverable
    /// condition.
    pub fn make_server(
        &self,
        client: Arc<dyn RuntimeClient>,
    ) -> Result<Box<dyn RuntimeServer>, FactoryStatus> {
        let provider = self
            .provider
            .as_ref()
            .expect("make_server called on a factory that is not open");
        provider.make_server(client)
    }

    /// Invoke `callback` with the provider's runtime information
    ///
    /// Runs synchronously on the calling thread; no ownership of the
    /// callback's captures is transferred.
    ///
    /// # Panics
    ///
    /// Panics if the factory is not open.
    pub fn call_with_server_info(&self, callback: &mut dyn FnMut(&ServerInfo)) {
        let provider = self
            .provider
            .as_ref()
            .expect("call_with_server_info called on a factory that is not open");
        provider.call_with_server_info(callback);
    }

    /// Whether a provider is currently bound
    pub fn is_open(&self) -> bool {
        self.provider.is_some()
    }

    /// Server version negotiated by the last successful `open`
    pub fn server_version(&self) -> u32 {
        self.server_version
    }
}

impl Drop for RuntimeFactory {
    fn drop(&mut self) {
        // The release hook runs exactly once even if the caller never
        // closed explicitly
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct TestClient;

    impl RuntimeClient for TestClient {
        fn max_job_count(&self) -> usize {
            4
        }

        fn min_stack_size(&self) -> usize {
            64 * 1024
        }
    }

    struct TestServer {
        version: u32,
    }

    impl RuntimeServer for TestServer {
        fn version(&self) -> u32 {
            self.version
        }
    }

    struct TestProvider {
        flavor: &'static str,
        min_client_version: u32,
        server_version: u32,
        opens: AtomicU32,
        closes: AtomicU32,
    }

    impl TestProvider {
        fn new(flavor: &'static str, min_client_version: u32, server_version: u32) -> Arc<Self> {
            Arc::new(TestProvider {
                flavor,
                min_client_version,
                server_version,
                opens: AtomicU32::new(0),
                closes: AtomicU32::new(0),
            })
        }
    }

    impl RuntimeProvider for TestProvider {
        fn flavor(&self) -> &'static str {
            self.flavor
        }

        fn open(&self, client_version: u32) -> Result<u32, FactoryStatus> {
            if client_version < self.min_client_version {
                return Err(FactoryStatus::IncompatibleVersion);
            }
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(self.server_version.min(client_version))
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }

        fn make_server(
            &self,
            client: Arc<dyn RuntimeClient>,
        ) -> Result<Box<dyn RuntimeServer>, FactoryStatus> {
            assert!(client.max_job_count() > 0);
            Ok(Box::new(TestServer {
                version: self.server_version,
            }))
        }

        fn call_with_server_info(&self, callback: &mut dyn FnMut(&ServerInfo)) {
            callback(&ServerInfo {
                flavor: self.flavor,
                server_version: self.server_version,
                description: format!("test provider ({})", self.flavor),
            });
        }
    }

    #[test]
    fn test_open_negotiates_version() {
        let provider = TestProvider::new("test-open", 1, 2);
        register_provider(provider.clone());

        let mut factory = RuntimeFactory::new("test-open");
        assert_eq!(factory.open(), FactoryStatus::Success);
        assert!(factory.is_open());
        assert_eq!(factory.server_version(), 2);
        assert_eq!(provider.opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_open_unknown_flavor() {
        let mut factory = RuntimeFactory::new("test-no-such-flavor");
        assert_eq!(factory.open(), FactoryStatus::NotFound);
        assert!(!factory.is_open());
    }

    #[test]
    fn test_open_incompatible_version() {
        register_provider(TestProvider::new("test-incompatible", CLIENT_VERSION + 1, 5));

        let mut factory = RuntimeFactory::new("test-incompatible");
        assert_eq!(factory.open(), FactoryStatus::IncompatibleVersion);
        assert!(!factory.is_open());
        assert!(factory.open().into_result().is_err());
    }

    #[test]
    fn test_make_server() {
        register_provider(TestProvider::new("test-make-server", 1, 2));

        let mut factory = RuntimeFactory::new("test-make-server");
        assert_eq!(factory.open(), FactoryStatus::Success);

        let server = factory.make_server(Arc::new(TestClient)).unwrap();
        assert_eq!(server.version(), 2);
    }

    #[test]
    #[should_panic(expected = "not open")]
    fn test_make_server_before_open_panics() {
        let factory = RuntimeFactory::new("test-unopened");
        let _ = factory.make_server(Arc::new(TestClient));
    }

    #[test]
    fn test_server_info_callback() {
        register_provider(TestProvider::new("test-info", 1, 2));

        let mut factory = RuntimeFactory::new("test-info");
        assert_eq!(factory.open(), FactoryStatus::Success);

        let mut seen = None;
        factory.call_with_server_info(&mut |info| {
            seen = Some((info.flavor, info.server_version));
        });
        assert_eq!(seen, Some(("test-info", 2)));
    }

    #[test]
    fn test_close_releases_once() {
        let provider = TestProvider::new("test-close", 1, 2);
        register_provider(provider.clone());

        let mut factory = RuntimeFactory::new("test-close");
        assert_eq!(factory.open(), FactoryStatus::Success);

        factory.close();
        assert_eq!(provider.closes.load(Ordering::SeqCst), 1);
        assert!(!factory.is_open());

        // Second close is a no-op, hook does not run again
        factory.close();
        assert_eq!(provider.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let mut factory = RuntimeFactory::new("test-never-opened");
        factory.close();
        assert!(!factory.is_open());
    }

    #[test]
    fn test_drop_closes() {
        let provider = TestProvider::new("test-drop", 1, 2);
        register_provider(provider.clone());

        {
            let mut factory = RuntimeFactory::new("test-drop");
            assert_eq!(factory.open(), FactoryStatus::Success);
        }
        assert_eq!(provider.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_last_registration_wins() {
        register_provider(TestProvider::new("test-replace", 1, 2));
        register_provider(TestProvider::new("test-replace", 1, 1));

        let mut factory = RuntimeFactory::new("test-replace");
        assert_eq!(factory.open(), FactoryStatus::Success);
        assert_eq!(factory.server_version(), 1);
    }
}
