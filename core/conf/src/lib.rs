//! authplug configuration object and helpers.
//!
//! Configuration can come from two sources:
//!
//! - A YAML file, loaded with [`load`].
//! - The flat key/value option list a broker hands to its plugins, decoded with
//!   [`Conf::from_options`].
//!
//! Either way the result is an immutable [`Conf`] built once at startup.
mod loading;
mod logging;
mod object;


pub use self::loading::load;
pub use self::loading::Error;
pub use self::logging::LogLevel;
pub use self::logging::LoggingConf;
pub use self::object::Conf;
