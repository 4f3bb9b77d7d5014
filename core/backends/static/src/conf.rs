//! Configuration for the static backend.
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use authplug_backend::Permission;

/// Static backend specific options.
///
/// Exactly one of the inline data and the data file must be set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conf {
    /// Credentials and rules provided inline.
    #[serde(default, rename = "static")]
    pub inline: Option<StaticData>,

    /// Path to a YAML file with credentials and rules.
    #[serde(default)]
    pub static_file: Option<String>,
}

impl Conf {
    /// Check that exactly one data source is configured.
    pub fn check(&self) -> Result<()> {
        match (&self.inline, &self.static_file) {
            (Some(_), Some(_)) => anyhow::bail!(ConfError::AmbiguousSource),
            (None, None) => anyhow::bail!(ConfError::NoSource),
            _ => Ok(()),
        }
    }

    /// Resolve the configured data, reading it from file if needed.
    pub fn data(&self) -> Result<StaticData> {
        self.check()?;
        match (&self.inline, &self.static_file) {
            (Some(data), _) => Ok(data.clone()),
            (None, Some(path)) => StaticData::load(path),
            (None, None) => anyhow::bail!(ConfError::NoSource),
        }
    }
}

/// Users, superusers, ACL rules and pre-shared keys served by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticData {
    /// Topic access rules.
    #[serde(default)]
    pub acls: Vec<AclRule>,

    /// Pre-shared keys by transport identity.
    #[serde(default)]
    pub psk_keys: BTreeMap<String, String>,

    /// Usernames exempt from access control.
    #[serde(default)]
    pub superusers: Vec<String>,

    /// Password hashes by username.
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

impl StaticData {
    /// Load static data from a YAML file.
    pub fn load(path: &str) -> Result<StaticData> {
        if !Path::new(path).exists() {
            anyhow::bail!(ConfError::FileNotFound(path.to_string()));
        }
        let file = File::open(path).with_context(|| ConfError::FileOpen(path.to_string()))?;
        let data =
            serde_yaml::from_reader(file).with_context(|| ConfError::FileDecode(path.to_string()))?;
        Ok(data)
    }
}

/// Access granted on topics matching a pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AclRule {
    /// Operations granted by the rule.
    pub access: Vec<Permission>,

    /// Topic pattern, `%u` is replaced with the requesting username.
    pub topic: String,

    /// User the rule applies to, all users if not set.
    #[serde(default)]
    pub username: Option<String>,
}

/// The static backend configuration is not valid.
#[derive(Debug, thiserror::Error)]
pub enum ConfError {
    /// Both inline data and a data file are configured.
    #[error("only one of static and static_file can be set")]
    AmbiguousSource,

    /// The backend options could not be decoded.
    #[error("the static backend configuration is not valid")]
    Decode,

    /// Unable to decode the data file at the given path.
    #[error("unable to decode static backend data from file at '{0}'")]
    // (path,)
    FileDecode(String),

    /// The data file was not found at the given path.
    #[error("static backend data file not found at '{0}'")]
    // (path,)
    FileNotFound(String),

    /// Unable to read the data file at the given path.
    #[error("unable to read static backend data file at '{0}'")]
    // (path,)
    FileOpen(String),

    /// Neither inline data nor a data file is configured.
    #[error("one of static or static_file must be set")]
    NoSource,

    /// An ACL rule grants no access.
    #[error("static ACL rule for topic '{0}' grants no access")]
    // (topic,)
    RuleNoAccess(String),

    /// An ACL rule has an invalid topic pattern.
    ///
    /// Rules can't use the `%c` placeholder since backends are not told the client id.
    #[error("static ACL rule topic '{0}' is not a valid pattern")]
    // (topic,)
    RuleTopic(String),
}
