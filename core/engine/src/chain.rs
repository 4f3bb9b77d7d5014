//! Ordered chain of backends consulted for every decision.
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use slog::Logger;

use authplug_backend::Access;
use authplug_backend::AuthLookup;
use authplug_backend::Backend;
use authplug_backend::BackendFactoryArgs;
use authplug_conf::Conf;
use authplug_hash::CredentialVerifier;

use crate::errors::BackendConfInvalid;
use crate::errors::BackendInitFailed;
use crate::errors::ChainEmpty;
use crate::errors::ChainTooLong;
use crate::errors::DuplicateBackend;
use crate::errors::PskDatabaseMissing;
use crate::errors::PskDatabaseUnknown;
use crate::telemetry::BACKEND_ERRORS;
use crate::Backends;

/// Maximum number of configured backends, not counting the pre-shared-key provider.
pub const MAX_BACKENDS: usize = 5;

/// A named backend in the chain.
pub struct Descriptor {
    backend: Arc<dyn Backend>,
    name: String,
}

impl Descriptor {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Backends consulted in order, first positive answer wins.
///
/// The chain is read-only once built: backends are shut down exactly once,
/// when [`BackendChain::shutdown`] is called or the chain is dropped.
pub struct BackendChain {
    closed: bool,
    entries: Vec<Descriptor>,
    logger: Logger,
}

impl BackendChain {
    /// Initialise all configured backends, in order.
    ///
    /// If the pre-shared-key provider is enabled it is placed first in the chain.
    /// Any failure is fatal: backends initialised before the failure are shut down.
    pub fn build(conf: &Conf, backends: &Backends, logger: &Logger) -> Result<BackendChain> {
        if conf.backends.is_empty() {
            anyhow::bail!(ChainEmpty);
        }
        slog::debug!(logger, "Configured backends order"; "order" => conf.backends.join(","));

        let mut seen = HashSet::new();
        for name in &conf.backends {
            if !seen.insert(name.as_str()) {
                anyhow::bail!(DuplicateBackend(name.clone()));
            }
        }

        let (psk, names): (Vec<&String>, Vec<&String>) = conf
            .backends
            .iter()
            .partition(|name| cfg!(feature = "psk") && *name == crate::PSK_BACKEND);
        if names.len() > MAX_BACKENDS {
            anyhow::bail!(ChainTooLong {
                count: names.len(),
                max: MAX_BACKENDS,
            });
        }

        let psk_database = if psk.is_empty() {
            None
        } else {
            let database = conf.psk_database.as_ref().ok_or(PskDatabaseMissing)?;
            if !names.contains(&database) {
                anyhow::bail!(PskDatabaseUnknown(database.clone()));
            }
            Some(database)
        };

        let options = conf.options_json();
        let mut chain = BackendChain {
            closed: false,
            entries: Vec::with_capacity(conf.backends.len()),
            logger: logger.clone(),
        };
        for name in names {
            let factory = backends.lookup(name)?;
            factory
                .conf_check(&options)
                .with_context(|| BackendConfInvalid(name.clone()))?;
            let backend_logger = logger.new(slog::o!("backend" => name.clone()));
            let args = BackendFactoryArgs {
                logger: &backend_logger,
                name: name.as_str(),
                options: &options,
            };
            let backend = factory
                .init(args)
                .with_context(|| BackendInitFailed(name.clone()))?;
            slog::debug!(logger, "Backend initialised"; "backend" => name);
            chain.entries.push(Descriptor {
                backend: Arc::from(backend),
                name: name.clone(),
            });
        }

        #[cfg(feature = "psk")]
        if let Some(database) = psk_database {
            let source = chain
                .find(database)
                .ok_or_else(|| PskDatabaseUnknown(database.clone()))?;
            let psk: Arc<dyn Backend> = Arc::new(crate::psk::PskBackend::borrow(&source.backend));
            chain.entries.insert(
                0,
                Descriptor {
                    backend: psk,
                    name: crate::PSK_BACKEND.to_string(),
                },
            );
            slog::debug!(logger, "PSK provider enabled"; "psk_database" => database);
        }
        #[cfg(not(feature = "psk"))]
        let _ = psk_database;

        Ok(chain)
    }

    /// Lookup a backend in the chain by name.
    pub fn find(&self, name: &str) -> Option<&Descriptor> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Names of the backends in chain order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(Descriptor::name).collect()
    }

    /// Shut down all backends in the chain.
    pub fn shutdown(mut self) {
        self.close();
    }
}

impl BackendChain {
    /// Find the first backend that authenticates the user.
    ///
    /// Returns the name of the authenticating backend or `None` if no backend did.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        verifier: &dyn CredentialVerifier,
    ) -> Option<&str> {
        for entry in &self.entries {
            slog::debug!(self.logger, "Checking backend credentials"; "backend" => &entry.name);
            let lookup = match entry.backend.authenticate(username, password) {
                Ok(lookup) => lookup,
                Err(error) => {
                    self.report(entry, "authenticate", &error);
                    continue;
                }
            };
            let authenticated = match lookup {
                AuthLookup::Authenticated => true,
                AuthLookup::HashToVerify(hash) => verifier.verify(password, &hash),
                AuthLookup::NotAuthenticated => false,
            };
            if authenticated {
                return Some(entry.name.as_str());
            }
        }
        None
    }

    /// Find the first backend that grants the requested access to the topic.
    pub fn acl_check(&self, username: &str, topic: &str, access: Access) -> Option<&str> {
        for entry in &self.entries {
            slog::debug!(self.logger, "Checking backend ACLs"; "backend" => &entry.name);
            match entry.backend.acl_check(username, topic, access) {
                Ok(true) => return Some(entry.name.as_str()),
                Ok(false) => (),
                Err(error) => self.report(entry, "acl_check", &error),
            }
        }
        None
    }

    /// Lookup a pre-shared key from the named backend.
    pub fn psk_key(&self, database: &str, identity: &str) -> Option<String> {
        let entry = self.find(database)?;
        match entry.backend.psk_key(identity) {
            Ok(key) => key,
            Err(error) => {
                self.report(entry, "psk_key", &error);
                None
            }
        }
    }

    /// Find the first backend that considers the user a superuser.
    pub fn superuser(&self, username: &str) -> Option<&str> {
        for entry in &self.entries {
            slog::debug!(self.logger, "Checking backend superusers"; "backend" => &entry.name);
            match entry.backend.superuser(username) {
                Ok(true) => return Some(entry.name.as_str()),
                Ok(false) => (),
                Err(error) => self.report(entry, "superuser", &error),
            }
        }
        None
    }
}

impl BackendChain {
    /// Shut down every backend, only the first time it is called.
    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for entry in self.entries.drain(..) {
            if let Err(error) = entry.backend.shutdown() {
                slog::warn!(
                    self.logger, "Backend failed to shut down cleanly";
                    "backend" => &entry.name,
                    "error" => format!("{:#}", error),
                );
            }
        }
    }

    /// Log and count a failed backend operation.
    fn report(&self, entry: &Descriptor, operation: &str, error: &anyhow::Error) {
        BACKEND_ERRORS
            .with_label_values(&[entry.name.as_str(), operation])
            .inc();
        slog::warn!(
            self.logger, "Backend operation failed, treating it as no match";
            "backend" => &entry.name,
            "operation" => operation,
            "error" => format!("{:#}", error),
        );
    }
}

impl Drop for BackendChain {
    fn drop(&mut self) {
        self.close();
    }
}
