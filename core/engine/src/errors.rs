//! Fatal configuration errors detected while initialising the engine.

/// The configuration of a backend was rejected by its factory.
#[derive(Debug, thiserror::Error)]
#[error("configuration for backend '{0}' is not valid")]
pub struct BackendConfInvalid(pub String);

/// A backend failed to initialise.
#[derive(Debug, thiserror::Error)]
#[error("backend '{0}' failed to initialise")]
pub struct BackendInitFailed(pub String);

/// A backend is not supported by this build.
#[derive(Debug, thiserror::Error)]
#[error("configured backend '{0}' is not supported by this build")]
pub struct BackendNotFound(pub String);

/// No backend was configured.
#[derive(Debug, thiserror::Error)]
#[error("no backends configured")]
pub struct ChainEmpty;

/// More backends were configured than the chain can hold.
#[derive(Debug, thiserror::Error)]
#[error("{count} backends configured but at most {max} are supported")]
pub struct ChainTooLong {
    pub count: usize,
    pub max: usize,
}

/// The same backend was listed more than once.
#[derive(Debug, thiserror::Error)]
#[error("backend '{0}' is configured more than once")]
pub struct DuplicateBackend(pub String);

/// The global ACL rule is not valid.
#[derive(Debug, thiserror::Error)]
pub enum GlobalAclInvalid {
    /// The rule does not grant read nor write access.
    #[error("global ACL pattern '{0}' grants no access")]
    // (pattern,)
    NoAccess(String),

    /// The rule has no topic pattern.
    #[error("global ACL pattern '{0}' does not specify a topic pattern")]
    // (pattern,)
    NoTopic(String),

    /// The rule topic pattern is not a valid pattern.
    #[error("global ACL pattern '{0}' has an invalid topic pattern")]
    // (pattern,)
    Topic(String),

    /// The rule has more fields than the access list and topic pattern.
    #[error("global ACL pattern '{0}' has unexpected trailing fields")]
    // (pattern,)
    TrailingFields(String),
}

/// The pre-shared-key provider is enabled without the `psk_database` option.
#[derive(Debug, thiserror::Error)]
#[error("the psk backend is configured so psk_database needs to be set")]
pub struct PskDatabaseMissing;

/// The `psk_database` option does not name a configured backend.
#[derive(Debug, thiserror::Error)]
#[error("psk_database '{0}' does not name a configured backend")]
pub struct PskDatabaseUnknown(pub String);

/// The superusers glob pattern is not valid.
#[derive(Debug, thiserror::Error)]
#[error("superusers pattern '{0}' is not a valid glob pattern")]
pub struct SuperusersPatternInvalid(pub String);
