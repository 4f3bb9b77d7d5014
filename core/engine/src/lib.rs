//! Decision engine answering broker authentication and authorisation requests.
//!
//! The engine combines two sources of trust:
//!
//! - A [`GlobalPolicy`]: an optional superuser glob pattern (with an optional password)
//!   and an optional global ACL rule, both evaluated before any backend.
//! - A [`BackendChain`]: the configured backends, consulted in order until one answers
//!   positively.
//!
//! Both are built once by [`AuthPlug::initialise`] and are read-only afterwards,
//! so an [`AuthPlug`] can be shared across request threads.
//! Any missing input or backend failure resolves to [`Decision::Denied`].
use anyhow::Result;
use slog::Logger;

use authplug_backend::Access;
use authplug_conf::Conf;
use authplug_hash::CredentialVerifier;

mod chain;
mod decision;
pub mod errors;
mod policy;
#[cfg(feature = "psk")]
mod psk;
mod registry;
mod telemetry;

#[cfg(test)]
mod tests;

pub use self::chain::BackendChain;
pub use self::chain::Descriptor;
pub use self::chain::MAX_BACKENDS;
pub use self::decision::Decision;
pub use self::decision::Grantor;
pub use self::policy::GlobalAcl;
pub use self::policy::GlobalPolicy;
pub use self::registry::Backends;
pub use self::telemetry::register_metrics;

use self::telemetry::AUTHENTICATE_COUNT;
use self::telemetry::AUTHORISE_COUNT;
use self::telemetry::PSK_LOOKUP_COUNT;

/// Name of the pre-shared-key provider in the `backends` list.
pub const PSK_BACKEND: &str = "psk";

/// Arguments to [`AuthPlug::initialise`].
pub struct AuthPlugArgs<'a> {
    /// Backend implementations available to the process.
    pub backends: &'a Backends,

    /// Configuration to initialise the engine with.
    pub conf: &'a Conf,

    /// Logger for the engine and its backends.
    pub logger: Logger,

    /// Verifier for password hashes returned by backends and the superusers password.
    pub verifier: Box<dyn CredentialVerifier>,
}

/// Authentication and authorisation decision engine.
pub struct AuthPlug {
    chain: BackendChain,
    logger: Logger,
    policy: GlobalPolicy,
    psk_database: Option<String>,
    verifier: Box<dyn CredentialVerifier>,
}

impl AuthPlug {
    /// Build the global policy and backend chain from configuration.
    ///
    /// Any configuration error is fatal and returned to the caller:
    /// the engine never runs partially configured.
    pub fn initialise(args: AuthPlugArgs) -> Result<AuthPlug> {
        let policy = GlobalPolicy::from_conf(args.conf, &args.logger)?;
        let chain = BackendChain::build(args.conf, args.backends, &args.logger)?;
        let psk_database = match chain.find(PSK_BACKEND) {
            Some(_) => args.conf.psk_database.clone(),
            None => None,
        };
        slog::info!(
            args.logger, "Authentication plugin initialised";
            "backends" => chain.names().join(","),
        );
        Ok(AuthPlug {
            chain,
            logger: args.logger,
            policy,
            psk_database,
            verifier: args.verifier,
        })
    }

    /// Check the credentials of a client.
    pub fn authenticate(&self, username: &str, password: &str) -> Decision {
        let decision = self.authenticate_inner(username, password);
        AUTHENTICATE_COUNT
            .with_label_values(&[decision.label()])
            .inc();
        decision
    }

    /// Check if a client is allowed the requested access to a topic.
    pub fn authorise(&self, client_id: &str, username: &str, topic: &str, access: Access) -> Decision {
        let decision = self.authorise_inner(client_id, username, topic, access);
        AUTHORISE_COUNT.with_label_values(&[decision.label()]).inc();
        decision
    }

    /// The backend chain decisions are delegated to.
    pub fn chain(&self) -> &BackendChain {
        &self.chain
    }

    /// Lookup the pre-shared key for a transport level identity.
    ///
    /// The returned key is truncated to at most `max_len` bytes.
    /// Returns `None` when the pre-shared-key provider is not enabled or has no key.
    pub fn fetch_psk_key(&self, hint: &str, identity: &str, max_len: usize) -> Option<Vec<u8>> {
        let key = self.fetch_psk_key_inner(hint, identity, max_len);
        let found = if key.is_some() { "yes" } else { "no" };
        PSK_LOOKUP_COUNT.with_label_values(&[found]).inc();
        key
    }

    /// Shut down all backends.
    pub fn shutdown(self) {
        slog::debug!(self.logger, "Shutting down authentication plugin");
        self.chain.shutdown();
    }
}

impl AuthPlug {
    fn authenticate_inner(&self, username: &str, password: &str) -> Decision {
        if username.is_empty() || password.is_empty() {
            slog::debug!(self.logger, "Authentication denied for missing username or password");
            return Decision::Denied;
        }

        let verifier = self.verifier.as_ref();
        if self.policy.superuser_credentials(username, password, verifier) {
            slog::debug!(self.logger, "Global superuser authenticated"; "username" => username);
            return Decision::Allowed(Grantor::GlobalSuperuser);
        }

        match self.chain.authenticate(username, password, verifier) {
            Some(backend) => {
                slog::debug!(
                    self.logger, "User authenticated";
                    "username" => username,
                    "backend" => backend,
                );
                Decision::Allowed(Grantor::Backend(backend.to_string()))
            }
            None => {
                slog::debug!(
                    self.logger, "User not authenticated by any backend";
                    "username" => username,
                );
                Decision::Denied
            }
        }
    }

    fn authorise_inner(&self, client_id: &str, username: &str, topic: &str, access: Access) -> Decision {
        if client_id.is_empty() || username.is_empty() || topic.is_empty() {
            slog::debug!(self.logger, "Authorisation denied for missing client id, username or topic");
            return Decision::Denied;
        }

        if self.policy.superuser(username) {
            slog::debug!(self.logger, "Global superuser authorised"; "username" => username);
            return Decision::Allowed(Grantor::GlobalSuperuser);
        }
        if self.policy.acl_allows(client_id, username, topic, access) {
            slog::debug!(
                self.logger, "Access granted by global ACL";
                "client_id" => client_id,
                "username" => username,
                "topic" => topic,
                "access" => access.to_string(),
            );
            return Decision::Allowed(Grantor::GlobalAcl);
        }

        // Superuser status is checked across all backends before any topic rule.
        if let Some(backend) = self.chain.superuser(username) {
            slog::debug!(
                self.logger, "Backend superuser authorised";
                "username" => username,
                "backend" => backend,
            );
            return Decision::Allowed(Grantor::Superuser(backend.to_string()));
        }
        match self.chain.acl_check(username, topic, access) {
            Some(backend) => {
                slog::debug!(
                    self.logger, "Access granted by backend";
                    "username" => username,
                    "topic" => topic,
                    "access" => access.to_string(),
                    "backend" => backend,
                );
                Decision::Allowed(Grantor::Backend(backend.to_string()))
            }
            None => {
                slog::debug!(
                    self.logger, "Access denied";
                    "username" => username,
                    "topic" => topic,
                    "access" => access.to_string(),
                );
                Decision::Denied
            }
        }
    }

    fn fetch_psk_key_inner(&self, hint: &str, identity: &str, max_len: usize) -> Option<Vec<u8>> {
        let database = self.psk_database.as_deref()?;
        if identity.is_empty() || max_len == 0 {
            return None;
        }
        slog::debug!(
            self.logger, "Looking up pre-shared key";
            "hint" => hint,
            "identity" => identity,
            "backend" => database,
        );
        let key = self.chain.psk_key(database, identity)?;
        let mut key = key.into_bytes();
        key.truncate(max_len);
        Some(key)
    }
}
