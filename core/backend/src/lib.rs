//! Capability interface for authplug credential and authorisation backends.
//!
//! A backend is an independent source of truth for one or more of:
//!
//! - Credentials: who the broker clients are and how they prove it.
//! - Superusers: identities exempt from topic level access control.
//! - Access Control Lists: which topics an identity can read from or write to.
//! - Pre-shared keys: symmetric keys for transport level authentication.
//!
//! Backends are created at startup by a [`BackendFactory`] selected by name
//! and are then consulted, in configured order, for every decision.
//!
//! ## Blocking calls
//!
//! All [`Backend`] operations are synchronous and may block (for example on a network
//! round trip to a database). Backends shared across request threads must be safe for
//! concurrent use and are responsible for any internal serialisation they need.
//!
//! ## Errors
//!
//! Errors returned by [`Backend`] operations never abort a decision: the caller treats them
//! as "no match from this backend" and moves on to the next backend in the chain.
use anyhow::Result;
use serde_json::Value as Json;
use slog::Logger;

mod access;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::BackendFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::BackendFixtureFactory;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::FixtureUser;

pub use self::access::Access;
pub use self::access::AccessMatch;
pub use self::access::Permission;
pub use self::access::UnknownPermission;

/// Outcome of a backend credentials lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AuthLookup {
    /// The backend verified the credentials itself and they are valid.
    Authenticated,

    /// The backend has no valid credentials for the user.
    NotAuthenticated,

    /// The backend knows the user and returns the stored hash to verify the password against.
    HashToVerify(String),
}

/// Operations implemented by credential and authorisation backends.
pub trait Backend: Send + Sync {
    /// Lookup credentials for a user.
    ///
    /// Backends able to check the password on their own (for example a directory bind)
    /// return [`AuthLookup::Authenticated`], others return the stored password hash
    /// with [`AuthLookup::HashToVerify`] and let the caller verify it.
    fn authenticate(&self, username: &str, password: &str) -> Result<AuthLookup>;

    /// Check if the user is exempt from access control.
    fn superuser(&self, username: &str) -> Result<bool>;

    /// Check if the user is granted the requested access to a topic.
    fn acl_check(&self, username: &str, topic: &str, access: Access) -> Result<bool>;

    /// Lookup the pre-shared key for a transport level identity.
    ///
    /// Only backends that can act as the source database of the PSK provider need to
    /// implement this method.
    fn psk_key(&self, _identity: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// Release any resource held by the backend.
    ///
    /// Called exactly once, when the backend chain is torn down.
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Initialisation logic for [`Backend`] implementations.
pub trait BackendFactory: Send + Sync {
    /// Validate the user provided configuration for the backend.
    fn conf_check(&self, options: &Json) -> Result<()>;

    /// Register backend specific metrics.
    fn register_metrics(&self, registry: &prometheus::Registry) -> Result<()>;

    /// Initialise a [`Backend`] object.
    fn init(&self, args: BackendFactoryArgs) -> Result<Box<dyn Backend>>;
}

/// Arguments passed to the [`BackendFactory`] initialisation method.
pub struct BackendFactoryArgs<'a> {
    /// Logger for the backend to use.
    pub logger: &'a Logger,

    /// Name the backend was selected with.
    pub name: &'a str,

    /// Configuration options not consumed by the engine itself.
    pub options: &'a Json,
}
