//! Built-in `authplug` commands.
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

use authplug_backend::Access;
use authplug_hash::Digest;

pub mod check;
pub mod decide;
pub mod hash;

/// Authentication and authorisation decisions for publish-subscribe brokers.
#[derive(Debug, Parser)]
#[command(version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the authplug configuration to use.
    #[arg(short = 'c', long = "config", default_value_t = String::from("authplug.yaml"))]
    pub config: String,

    /// Print metrics in prometheus text format once the command completes.
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Select the authplug command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Select the authplug command to run.
#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Check if a client can access a topic.
    Acl(AclArgs),

    /// Check the credentials of a client.
    #[command(alias = "authenticate")]
    Auth(AuthArgs),

    /// Validate the configuration by initialising and shutting down all backends.
    Check,

    /// Generate a PBKDF2 password hash.
    Hash(HashArgs),

    /// Lookup the pre-shared key for a transport level identity.
    Psk(PskArgs),
}

/// Arguments for the `acl` command.
#[derive(Clone, Debug, Args)]
pub struct AclArgs {
    /// Access requested to the topic.
    #[arg(long, value_enum, default_value_t = AccessArg::Read)]
    pub access: AccessArg,

    /// Client identifier of the requesting client.
    #[arg(long)]
    pub client_id: String,

    /// Topic the client wants to access.
    #[arg(long)]
    pub topic: String,

    /// Username of the requesting client.
    #[arg(short, long)]
    pub username: String,
}

/// Arguments for the `auth` command.
#[derive(Clone, Debug, Args)]
pub struct AuthArgs {
    /// Password to check.
    #[arg(short, long)]
    pub password: String,

    /// Username to check.
    #[arg(short, long)]
    pub username: String,
}

/// Arguments for the `hash` command.
#[derive(Clone, Debug, Args)]
pub struct HashArgs {
    /// Digest function for PBKDF2.
    #[arg(long, default_value_t = Digest::Sha256)]
    pub digest: Digest,

    /// Number of PBKDF2 iterations.
    #[arg(long, default_value_t = authplug_hash::DEFAULT_ITERATIONS)]
    pub iterations: u32,

    /// Password to hash.
    #[arg(short, long)]
    pub password: String,
}

/// Arguments for the `psk` command.
#[derive(Clone, Debug, Args)]
pub struct PskArgs {
    /// Identity hint sent by the broker.
    #[arg(long, default_value_t = String::new())]
    pub hint: String,

    /// Transport level identity to lookup.
    #[arg(short, long)]
    pub identity: String,

    /// Maximum length, in bytes, of the returned key.
    #[arg(long, default_value_t = 64)]
    pub max_len: usize,
}

/// Access modes that can be requested from the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum AccessArg {
    Read,
    Write,
    #[value(alias = "read-write")]
    Readwrite,
}

impl From<AccessArg> for Access {
    fn from(value: AccessArg) -> Self {
        match value {
            AccessArg::Read => Access::READ,
            AccessArg::Write => Access::WRITE,
            AccessArg::Readwrite => Access::READ_WRITE,
        }
    }
}
