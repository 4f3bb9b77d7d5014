//! Initialise the decision engine for commands that need it.
use anyhow::Result;
use slog::Logger;

use authplug_conf::Conf;
use authplug_engine::AuthPlug;
use authplug_engine::AuthPlugArgs;
use authplug_engine::Backends;
use authplug_hash::Pbkdf2Verifier;

/// Register all supported backends.
///
/// Supported backends can be tuned at compile time using crate features.
pub fn register_default_backends(backends: &mut Backends) -> &mut Backends {
    #[cfg(feature = "static-backend")]
    backends.register("static", authplug_backend_static::StaticFactory);
    backends
}

/// Register metrics and initialise the decision engine from configuration.
pub fn engine(conf: &Conf, logger: &Logger, registry: &prometheus::Registry) -> Result<AuthPlug> {
    let mut backends = Backends::empty();
    register_default_backends(&mut backends);
    slog::debug!(
        logger, "Supported backends registered";
        "backends" => backends.names().join(","),
    );

    authplug_engine::register_metrics(registry)?;
    backends.register_metrics(&conf.backends, registry)?;
    AuthPlug::initialise(AuthPlugArgs {
        backends: &backends,
        conf,
        logger: logger.clone(),
        verifier: Box::new(Pbkdf2Verifier),
    })
}
