//! Backend serving credentials, superusers, ACL rules and pre-shared keys from configuration.
//!
//! Data is provided inline with the `static` option or read from the YAML file
//! at the `static_file` path:
//!
//! ```yaml
//! users:
//!   alice: "PBKDF2$sha256$901$..."
//! superusers:
//!   - admin
//! acls:
//!   - topic: "users/%u/#"
//!     access: [read, write]
//!   - username: alice
//!     topic: "sensors/+/temperature"
//!     access: [read]
//! psk_keys:
//!   device-1: "6b6579"
//! ```
//!
//! ACL rules grant access only when all the requested operations are listed.
mod backend;
mod conf;
mod factory;
mod telemetry;


pub use self::backend::StaticBackend;
pub use self::conf::AclRule;
pub use self::conf::Conf;
pub use self::conf::ConfError;
pub use self::conf::StaticData;
pub use self::factory::StaticFactory;
