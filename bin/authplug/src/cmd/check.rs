//! Validate configuration by initialising the decision engine.
use anyhow::Result;
use slog::Logger;

use authplug_conf::Conf;

use crate::EXIT_ALLOWED;

/// Initialise and shut down all configured backends.
pub fn run(conf: &Conf, logger: &Logger, registry: &prometheus::Registry) -> Result<i32> {
    let plug = crate::init::engine(conf, logger, registry)?;
    let backends = plug.chain().names().join(",");
    plug.shutdown();
    println!("configuration is valid, backends: {}", backends);
    Ok(EXIT_ALLOWED)
}
