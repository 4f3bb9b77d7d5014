//! Configure the process logger from the loaded configuration.
use std::io::stderr;
use std::sync::Mutex;

use slog::Drain;
use slog::IgnoreResult;
use slog::Logger;
use slog::Never;
use slog::SendSyncRefUnwindSafeDrain;
use slog::SendSyncUnwindSafeDrain;
use slog_async::Async;
use slog_json::Json;

use authplug_conf::LoggingConf;

/// Alternative implementation of slog's `LevelFilter` with `Ok == ()`.
///
/// The default `LevelFilter` implementation wraps `D::Ok` into an [`Option`],
/// which makes it impossible to wrap a filtering drain into a [`Logger`].
#[derive(Debug, Clone)]
struct LevelFilter<D: Drain>(pub D, pub slog::Level);

impl<D: Drain> Drain for LevelFilter<D> {
    type Ok = ();
    type Err = D::Err;

    fn log(
        &self,
        record: &slog::Record,
        logger_values: &slog::OwnedKVList,
    ) -> Result<Self::Ok, Self::Err> {
        if record.level().is_at_least(self.1) {
            self.0.log(record, logger_values)?;
        }
        Ok(())
    }
}

/// Converts a [`Drain`] into a [`Logger`] setting global tags.
fn into_logger<D>(drain: D) -> Logger
where
    D: SendSyncUnwindSafeDrain<Ok = (), Err = Never>,
    D: 'static + SendSyncRefUnwindSafeDrain<Err = Never, Ok = ()>,
{
    Logger::root(drain, slog::o!("version" => env!("CARGO_PKG_VERSION")))
}

/// Creates a [`Logger`] emitting JSON records to standard error.
///
/// Standard output is reserved for command results.
pub fn configure(conf: &LoggingConf) -> Logger {
    let drain = Mutex::new(Json::default(stderr())).map(IgnoreResult::new);
    let drain = LevelFilter(drain, conf.level.into());
    match conf.asynchronous {
        true => into_logger(Async::new(drain).build().ignore_res()),
        false => into_logger(drain),
    }
}
