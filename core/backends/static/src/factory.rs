//! Initialise static backends.
use anyhow::Context;
use anyhow::Result;
use serde_json::Value as Json;

use authplug_backend::Backend;
use authplug_backend::BackendFactory;
use authplug_backend::BackendFactoryArgs;

use crate::conf::Conf;
use crate::conf::ConfError;
use crate::StaticBackend;

/// Initialise backends serving credentials and ACLs from configuration.
pub struct StaticFactory;

impl StaticFactory {
    fn decode(options: &Json) -> Result<Conf> {
        let conf = serde_json::from_value(options.clone()).context(ConfError::Decode)?;
        Ok(conf)
    }
}

impl BackendFactory for StaticFactory {
    fn conf_check(&self, options: &Json) -> Result<()> {
        StaticFactory::decode(options)?.check()
    }

    fn register_metrics(&self, registry: &prometheus::Registry) -> Result<()> {
        crate::telemetry::register_metrics(registry)
    }

    fn init(&self, args: BackendFactoryArgs) -> Result<Box<dyn Backend>> {
        let conf = StaticFactory::decode(args.options)?;
        let data = conf.data()?;
        let backend = StaticBackend::new(data, args.logger.clone())?;
        Ok(Box::new(backend))
    }
}
