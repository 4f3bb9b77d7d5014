//! Lookups against the static data.
use std::collections::BTreeMap;
use std::collections::HashSet;

use anyhow::Context;
use anyhow::Result;
use slog::Logger;

use authplug_backend::Access;
use authplug_backend::AccessMatch;
use authplug_backend::AuthLookup;
use authplug_backend::Backend;

use crate::conf::ConfError;
use crate::conf::StaticData;
use crate::telemetry::STATIC_OPS_COUNT;

/// Placeholder for the client id, which backends never see.
const CLIENT_ID_PLACEHOLDER: &str = "%c";

/// ACL rule with the granted access resolved.
#[derive(Debug)]
struct Rule {
    access: Access,
    topic: String,
    username: Option<String>,
}

impl Rule {
    fn grants(&self, username: &str, topic: &str, access: Access) -> bool {
        let user_match = match &self.username {
            None => true,
            Some(rule_user) => rule_user == username,
        };
        user_match
            && authplug_topic::matches_with_substitution(&self.topic, topic, "", username)
            && AccessMatch::All.permits(access, self.access)
    }
}

/// Backend serving credentials and ACLs from configuration.
pub struct StaticBackend {
    logger: Logger,
    psk_keys: BTreeMap<String, String>,
    rules: Vec<Rule>,
    superusers: HashSet<String>,
    users: BTreeMap<String, String>,
}

impl StaticBackend {
    /// Validate the ACL rules and index the static data.
    pub fn new(data: StaticData, logger: Logger) -> Result<StaticBackend> {
        let mut rules = Vec::with_capacity(data.acls.len());
        for rule in data.acls {
            if rule.topic.contains(CLIENT_ID_PLACEHOLDER) {
                anyhow::bail!(ConfError::RuleTopic(rule.topic));
            }
            authplug_topic::validate(&rule.topic)
                .with_context(|| ConfError::RuleTopic(rule.topic.clone()))?;
            let access: Access = rule.access.into_iter().collect();
            if access.is_empty() {
                anyhow::bail!(ConfError::RuleNoAccess(rule.topic));
            }
            rules.push(Rule {
                access,
                topic: rule.topic,
                username: rule.username,
            });
        }

        slog::debug!(
            logger, "Static backend data loaded";
            "users" => data.users.len(),
            "superusers" => data.superusers.len(),
            "acls" => rules.len(),
            "psk_keys" => data.psk_keys.len(),
        );
        Ok(StaticBackend {
            logger,
            psk_keys: data.psk_keys,
            rules,
            superusers: data.superusers.into_iter().collect(),
            users: data.users,
        })
    }
}

impl Backend for StaticBackend {
    fn authenticate(&self, username: &str, _: &str) -> Result<AuthLookup> {
        STATIC_OPS_COUNT.with_label_values(&["authenticate"]).inc();
        let lookup = match self.users.get(username) {
            Some(hash) => AuthLookup::HashToVerify(hash.clone()),
            None => AuthLookup::NotAuthenticated,
        };
        Ok(lookup)
    }

    fn superuser(&self, username: &str) -> Result<bool> {
        STATIC_OPS_COUNT.with_label_values(&["superuser"]).inc();
        Ok(self.superusers.contains(username))
    }

    fn acl_check(&self, username: &str, topic: &str, access: Access) -> Result<bool> {
        STATIC_OPS_COUNT.with_label_values(&["acl_check"]).inc();
        let granted = self
            .rules
            .iter()
            .any(|rule| rule.grants(username, topic, access));
        if granted {
            slog::trace!(
                self.logger, "Static ACL rule matched";
                "username" => username,
                "topic" => topic,
            );
        }
        Ok(granted)
    }

    fn psk_key(&self, identity: &str) -> Result<Option<String>> {
        STATIC_OPS_COUNT.with_label_values(&["psk_key"]).inc();
        Ok(self.psk_keys.get(identity).cloned())
    }
}
