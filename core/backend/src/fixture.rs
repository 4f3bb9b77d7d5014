//! Scriptable in-memory [`Backend`] for unit tests.
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;
use serde_json::Value as Json;

use super::Access;
use super::AuthLookup;
use super::Backend;
use super::BackendFactory;
use super::BackendFactoryArgs;

/// Credentials known to a [`BackendFixture`].
#[derive(Clone, Debug)]
pub enum FixtureUser {
    /// The backend checks the password itself and authenticates on exact match.
    Password(String),

    /// The backend hands the stored hash back for verification.
    Hash(String),
}

/// In-memory implementation of a mock [`Backend`] for unit tests.
///
/// Clones share state so tests can keep a handle to inspect recorded calls
/// after the fixture is moved into a backend chain.
#[derive(Clone, Default)]
pub struct BackendFixture {
    inner: Arc<Mutex<BackendFixtureState>>,
}

#[derive(Default)]
struct BackendFixtureState {
    acls: Vec<(String, String, Access)>,
    calls: Vec<String>,
    failing: bool,
    psk_keys: HashMap<String, String>,
    shutdowns: usize,
    superusers: HashSet<String>,
    users: HashMap<String, FixtureUser>,
}

impl BackendFixture {
    /// Lock and access the shared inner state.
    fn access(&self) -> MutexGuard<BackendFixtureState> {
        self.inner
            .lock()
            .expect("BackendFixture::inner state lock poisoned")
    }

    /// Grant `access` to `topic` for `username` (exact topic match only).
    pub fn acl<S1, S2>(&self, username: S1, topic: S2, access: Access) -> &Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        self.access()
            .acls
            .push((username.into(), topic.into(), access));
        self
    }

    /// List of operations invoked on the backend, in order.
    pub fn calls(&self) -> Vec<String> {
        self.access().calls.clone()
    }

    /// Make every operation return an error.
    pub fn failing(&self) -> &Self {
        self.access().failing = true;
        self
    }

    /// Register a pre-shared key for an identity.
    pub fn psk<S1, S2>(&self, identity: S1, key: S2) -> &Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        self.access().psk_keys.insert(identity.into(), key.into());
        self
    }

    /// Number of times the backend was shut down.
    pub fn shutdowns(&self) -> usize {
        self.access().shutdowns
    }

    /// Mark a user as superuser.
    pub fn superuser<S: Into<String>>(&self, username: S) -> &Self {
        self.access().superusers.insert(username.into());
        self
    }

    /// Register credentials for a user.
    pub fn user<S: Into<String>>(&self, username: S, user: FixtureUser) -> &Self {
        self.access().users.insert(username.into(), user);
        self
    }

    /// Record a call and fail it if the fixture is failing.
    fn record(&self, call: String) -> Result<MutexGuard<BackendFixtureState>> {
        let mut state = self.access();
        state.calls.push(call);
        if state.failing {
            anyhow::bail!("BackendFixture configured to fail");
        }
        Ok(state)
    }
}

impl Backend for BackendFixture {
    fn authenticate(&self, username: &str, password: &str) -> Result<AuthLookup> {
        let state = self.record(format!("authenticate:{}", username))?;
        let lookup = match state.users.get(username) {
            None => AuthLookup::NotAuthenticated,
            Some(FixtureUser::Password(expected)) if expected == password => {
                AuthLookup::Authenticated
            }
            Some(FixtureUser::Password(_)) => AuthLookup::NotAuthenticated,
            Some(FixtureUser::Hash(hash)) => AuthLookup::HashToVerify(hash.clone()),
        };
        Ok(lookup)
    }

    fn superuser(&self, username: &str) -> Result<bool> {
        let state = self.record(format!("superuser:{}", username))?;
        Ok(state.superusers.contains(username))
    }

    fn acl_check(&self, username: &str, topic: &str, access: Access) -> Result<bool> {
        let state = self.record(format!("acl_check:{}:{}", username, topic))?;
        let granted = state.acls.iter().any(|(user, rule, granted)| {
            user == username && rule == topic && granted.contains(access)
        });
        Ok(granted)
    }

    fn psk_key(&self, identity: &str) -> Result<Option<String>> {
        let state = self.record(format!("psk_key:{}", identity))?;
        Ok(state.psk_keys.get(identity).cloned())
    }

    fn shutdown(&self) -> Result<()> {
        let mut state = self.access();
        state.calls.push("shutdown".to_string());
        state.shutdowns += 1;
        Ok(())
    }
}

/// [`BackendFactory`] handing out a shared [`BackendFixture`].
#[derive(Clone, Default)]
pub struct BackendFixtureFactory {
    /// Backend returned by every initialisation.
    pub backend: BackendFixture,

    /// Fail configuration checks.
    pub fail_conf: bool,

    /// Fail backend initialisation.
    pub fail_init: bool,
}

impl BackendFixtureFactory {
    /// Factory handing out the given fixture.
    pub fn new(backend: BackendFixture) -> Self {
        Self {
            backend,
            fail_conf: false,
            fail_init: false,
        }
    }
}

impl BackendFactory for BackendFixtureFactory {
    fn conf_check(&self, _: &Json) -> Result<()> {
        if self.fail_conf {
            anyhow::bail!("BackendFixtureFactory configured to reject configuration");
        }
        Ok(())
    }

    fn register_metrics(&self, _: &prometheus::Registry) -> Result<()> {
        Ok(())
    }

    fn init(&self, _: BackendFactoryArgs) -> Result<Box<dyn Backend>> {
        if self.fail_init {
            anyhow::bail!("BackendFixtureFactory configured to fail initialisation");
        }
        Ok(Box::new(self.backend.clone()))
    }
}
