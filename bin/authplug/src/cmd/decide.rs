//! Run decisions against the configured engine and report them as JSON.
use anyhow::Result;
use serde::Serialize;
use slog::Logger;

use authplug_conf::Conf;
use authplug_engine::Decision;

use super::AclArgs;
use super::AuthArgs;
use super::PskArgs;
use crate::EXIT_ALLOWED;
use crate::EXIT_DENIED;

/// Decision report printed to standard output.
#[derive(Debug, Serialize)]
pub struct Report {
    pub allowed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grantor: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Report {
    fn exit_code(&self) -> i32 {
        if self.allowed {
            EXIT_ALLOWED
        } else {
            EXIT_DENIED
        }
    }

    fn print(&self) -> Result<i32> {
        println!("{}", serde_json::to_string(self)?);
        Ok(self.exit_code())
    }
}

impl From<Decision> for Report {
    fn from(decision: Decision) -> Self {
        Report {
            allowed: decision.is_allowed(),
            grantor: decision.grantor().map(ToString::to_string),
            key: None,
        }
    }
}

/// Check if a client can access a topic.
pub fn acl(
    args: &AclArgs,
    conf: &Conf,
    logger: &Logger,
    registry: &prometheus::Registry,
) -> Result<i32> {
    let plug = crate::init::engine(conf, logger, registry)?;
    let decision = plug.authorise(
        &args.client_id,
        &args.username,
        &args.topic,
        args.access.into(),
    );
    plug.shutdown();
    Report::from(decision).print()
}

/// Check the credentials of a client.
pub fn auth(
    args: &AuthArgs,
    conf: &Conf,
    logger: &Logger,
    registry: &prometheus::Registry,
) -> Result<i32> {
    let plug = crate::init::engine(conf, logger, registry)?;
    let decision = plug.authenticate(&args.username, &args.password);
    plug.shutdown();
    Report::from(decision).print()
}

/// Lookup the pre-shared key for an identity.
pub fn psk(
    args: &PskArgs,
    conf: &Conf,
    logger: &Logger,
    registry: &prometheus::Registry,
) -> Result<i32> {
    let plug = crate::init::engine(conf, logger, registry)?;
    let key = plug.fetch_psk_key(&args.hint, &args.identity, args.max_len);
    plug.shutdown();
    let report = Report {
        allowed: key.is_some(),
        grantor: None,
        key: key.map(|key| String::from_utf8_lossy(&key).into_owned()),
    };
    report.print()
}
