//! Telemetry for the static backend.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::CounterVec;
use prometheus::Opts;

/// Number of lookups served by static backends.
pub static STATIC_OPS_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "authplug_static_ops_count",
            "Number of lookups served by static backends",
        ),
        &["operation"],
    )
    .expect("failed to initialise STATIC_OPS_COUNT counter")
});

static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// Register static backend metrics, the first time only.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }
    reg.register(Box::new(STATIC_OPS_COUNT.clone()))?;
    Ok(())
}
