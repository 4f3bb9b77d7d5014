//! Command line front end to the authplug decision engine.
//!
//! Decision commands exit with [`EXIT_ALLOWED`] or [`EXIT_DENIED`] so they can be
//! used from scripts and broker integration tests.
use anyhow::Result;
use clap::Parser;
use prometheus::Encoder;

use authplug_conf::Conf;

mod cmd;
mod init;
mod logging;

#[cfg(test)]
mod tests;

pub use self::cmd::Cli;
pub use self::init::register_default_backends;

/// Process exit code for allowed decisions (and successful commands).
pub const EXIT_ALLOWED: i32 = 0;

/// Process exit code for denied decisions.
pub const EXIT_DENIED: i32 = 2;

/// Invoke a command implementation with the loaded configuration.
pub fn execute(cli: Cli, conf: Conf) -> Result<i32> {
    let logger = logging::configure(&conf.logging);
    let registry = prometheus::Registry::new();
    let code = match &cli.command {
        cmd::Command::Acl(args) => cmd::decide::acl(args, &conf, &logger, &registry)?,
        cmd::Command::Auth(args) => cmd::decide::auth(args, &conf, &logger, &registry)?,
        cmd::Command::Check => cmd::check::run(&conf, &logger, &registry)?,
        cmd::Command::Hash(args) => cmd::hash::run(args)?,
        cmd::Command::Psk(args) => cmd::decide::psk(args, &conf, &logger, &registry)?,
    };
    if cli.metrics {
        let mut buffer = Vec::new();
        prometheus::TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        print!("{}", String::from_utf8_lossy(&buffer));
    }
    Ok(code)
}

/// Parse command line arguments, load configuration and invoke [`execute`].
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    let conf = match cli.command {
        // Hashing passwords does not need a configuration file.
        cmd::Command::Hash(_) => Conf::default(),
        _ => authplug_conf::load(&cli.config)?,
    };
    execute(cli, conf)
}
