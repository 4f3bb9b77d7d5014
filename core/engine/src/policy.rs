//! Global overrides evaluated before the backend chain is consulted.
use anyhow::Context;
use anyhow::Result;
use slog::Logger;

use authplug_backend::Access;
use authplug_backend::AccessMatch;
use authplug_backend::Permission;
use authplug_conf::Conf;
use authplug_hash::CredentialVerifier;

use crate::errors::GlobalAclInvalid;
use crate::errors::SuperusersPatternInvalid;

/// Broker wide access rule applied before any backend specific rule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GlobalAcl {
    /// Access granted by the rule, never empty.
    pub access: Access,

    /// Topic pattern, possibly with `%c` and `%u` placeholders.
    pub topic: String,
}

impl GlobalAcl {
    /// Parse a rule in the `<access-list> <topic-pattern>` format.
    ///
    /// The access list is a comma separated list of `read` and `write` tokens.
    /// Unknown tokens are ignored but the rule must grant some access.
    pub fn parse(pattern: &str, logger: &Logger) -> Result<GlobalAcl> {
        let mut fields = pattern.split_whitespace();
        let permissions = fields
            .next()
            .ok_or_else(|| GlobalAclInvalid::NoTopic(pattern.to_string()))?;
        let topic = fields
            .next()
            .ok_or_else(|| GlobalAclInvalid::NoTopic(pattern.to_string()))?;
        if fields.next().is_some() {
            anyhow::bail!(GlobalAclInvalid::TrailingFields(pattern.to_string()));
        }

        let mut access = Access::NONE;
        for token in permissions.split(',').filter(|token| !token.is_empty()) {
            match token.parse::<Permission>() {
                Ok(permission) => access |= Access::from(permission),
                Err(error) => slog::warn!(
                    logger, "Ignoring unknown global ACL access token";
                    "token" => token,
                    "error" => error.to_string(),
                ),
            }
        }
        if access.is_empty() {
            anyhow::bail!(GlobalAclInvalid::NoAccess(pattern.to_string()));
        }

        authplug_topic::validate(topic)
            .with_context(|| GlobalAclInvalid::Topic(pattern.to_string()))?;
        Ok(GlobalAcl {
            access,
            topic: topic.to_string(),
        })
    }
}

/// Superuser and global ACL overrides that bypass the backend chain.
#[derive(Debug)]
pub struct GlobalPolicy {
    acl: Option<GlobalAcl>,
    access_match: AccessMatch,
    superusers: Option<glob::Pattern>,
    superusers_password: Option<String>,
}

impl GlobalPolicy {
    /// Build the global policy from the configuration, rejecting invalid rules.
    pub fn from_conf(conf: &Conf, logger: &Logger) -> Result<GlobalPolicy> {
        let superusers = match &conf.superusers {
            None => None,
            Some(pattern) => {
                let pattern = glob::Pattern::new(pattern)
                    .with_context(|| SuperusersPatternInvalid(pattern.clone()))?;
                Some(pattern)
            }
        };
        let acl = match &conf.global_acl_pattern {
            None => None,
            Some(pattern) => Some(GlobalAcl::parse(pattern, logger)?),
        };
        if let Some(acl) = &acl {
            slog::debug!(
                logger, "Global ACL rule enabled";
                "access" => acl.access.to_string(),
                "topic" => &acl.topic,
            );
        }
        Ok(GlobalPolicy {
            acl,
            access_match: conf.acl_access_match,
            superusers,
            superusers_password: conf.superusers_password.clone(),
        })
    }

    /// The global ACL rule, if one is configured.
    pub fn acl(&self) -> Option<&GlobalAcl> {
        self.acl.as_ref()
    }

    /// Check if the global ACL rule grants the requested access.
    pub fn acl_allows(&self, client_id: &str, username: &str, topic: &str, access: Access) -> bool {
        let acl = match &self.acl {
            None => return false,
            Some(acl) => acl,
        };
        authplug_topic::matches_with_substitution(&acl.topic, topic, client_id, username)
            && self.access_match.permits(access, acl.access)
    }

    /// Check if the username matches the superusers pattern.
    pub fn superuser(&self, username: &str) -> bool {
        self.superusers
            .as_ref()
            .map(|pattern| pattern.matches(username))
            .unwrap_or(false)
    }

    /// Check if the credentials are those of a global superuser.
    ///
    /// Requires both the superusers pattern and password to be configured.
    pub fn superuser_credentials(
        &self,
        username: &str,
        password: &str,
        verifier: &dyn CredentialVerifier,
    ) -> bool {
        match &self.superusers_password {
            Some(hash) => self.superuser(username) && verifier.verify(password, hash),
            None => false,
        }
    }
}
