//! Data object storing authplug's configuration.
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value as Json;

use authplug_backend::AccessMatch;

use super::Error;
use super::LoggingConf;

/// Broker option keys that set the logging level.
const LOG_LEVEL_KEYS: [&str; 2] = ["log_level", "plugin_log_level"];

/// Global configuration for the authplug decision engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conf {
    /// How requested access is compared with the access granted by the global ACL rule.
    #[serde(default)]
    pub acl_access_match: AccessMatch,

    /// Ordered list of backends to consult.
    ///
    /// Can be given as a comma separated string or as a list.
    #[serde(default, deserialize_with = "Conf::deserialize_backends")]
    pub backends: Vec<String>,

    /// Global ACL rule in the `<access-list> <topic-pattern>` format.
    #[serde(default)]
    pub global_acl_pattern: Option<String>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConf,

    /// Name of the backend the pre-shared-key provider borrows authorisation from.
    #[serde(default)]
    pub psk_database: Option<String>,

    /// Glob pattern of usernames exempt from access control.
    #[serde(default)]
    pub superusers: Option<String>,

    /// Password hash for the users matching [`Conf::superusers`].
    #[serde(default)]
    pub superusers_password: Option<String>,

    /// Backend specific configuration options.
    #[serde(default, flatten)]
    pub options: Map<String, Json>,
}

impl Conf {
    /// Decode configuration from the flat key/value options provided by brokers.
    ///
    /// Values are decoded as strings, with the exception of the `log_level`
    /// (or `plugin_log_level`) key mapped onto [`LoggingConf::level`].
    pub fn from_options<I, K, V>(options: I) -> Result<Conf>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut conf = Map::new();
        let mut logging = Map::new();
        for (key, value) in options {
            let key = key.into();
            let value = Json::String(value.into());
            if LOG_LEVEL_KEYS.contains(&key.as_str()) {
                logging.insert("level".to_string(), value);
            } else {
                conf.insert(key, value);
            }
        }
        if !logging.is_empty() {
            conf.insert("logging".to_string(), Json::Object(logging));
        }
        let conf = serde_json::from_value(Json::Object(conf)).context(Error::Options)?;
        Ok(conf)
    }

    /// Backend specific options as a JSON object.
    pub fn options_json(&self) -> Json {
        Json::Object(self.options.clone())
    }

    /// Decode backends from either a comma separated string or a list of names.
    fn deserialize_backends<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Backends {
            Csv(String),
            List(Vec<String>),
        }

        let backends = match Backends::deserialize(deserializer)? {
            Backends::Csv(list) if list.trim().is_empty() => Vec::new(),
            Backends::Csv(list) => list.split(',').map(|name| name.trim().to_string()).collect(),
            Backends::List(list) => list.into_iter().map(|name| name.trim().to_string()).collect(),
        };
        Ok(backends)
    }
}
