//! Pre-shared-key provider descriptor.
use std::sync::Arc;
use std::sync::Weak;

use anyhow::Result;

use authplug_backend::Access;
use authplug_backend::AuthLookup;
use authplug_backend::Backend;

/// Backend for clients authenticated at the transport layer with a pre-shared key.
///
/// PSK clients never authenticate with a password, while superuser and ACL checks
/// are delegated to the `psk_database` backend so they follow the same policies.
///
/// The source backend is borrowed, not owned: it is released by its own descriptor.
pub struct PskBackend {
    source: Weak<dyn Backend>,
}

impl PskBackend {
    /// Borrow the authorisation capabilities of a backend.
    pub fn borrow(source: &Arc<dyn Backend>) -> PskBackend {
        PskBackend {
            source: Arc::downgrade(source),
        }
    }
}

impl Backend for PskBackend {
    fn authenticate(&self, _: &str, _: &str) -> Result<AuthLookup> {
        Ok(AuthLookup::NotAuthenticated)
    }

    fn superuser(&self, username: &str) -> Result<bool> {
        match self.source.upgrade() {
            Some(source) => source.superuser(username),
            None => Ok(false),
        }
    }

    fn acl_check(&self, username: &str, topic: &str, access: Access) -> Result<bool> {
        match self.source.upgrade() {
            Some(source) => source.acl_check(username, topic, access),
            None => Ok(false),
        }
    }
}
