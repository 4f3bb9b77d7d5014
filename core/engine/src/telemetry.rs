//! Telemetry related to authentication and authorisation decisions.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::CounterVec;
use prometheus::Opts;

/// Total number of authentication decisions.
pub static AUTHENTICATE_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "authplug_authenticate_count",
            "Total number of authentication decisions",
        ),
        &["result"],
    )
    .expect("failed to initialise AUTHENTICATE_COUNT counter")
});

/// Total number of authorisation decisions.
pub static AUTHORISE_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "authplug_authorise_count",
            "Total number of authorisation decisions",
        ),
        &["result"],
    )
    .expect("failed to initialise AUTHORISE_COUNT counter")
});

/// Number of backend operations that resulted in error.
pub static BACKEND_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "authplug_backend_errors",
            "Number of backend operations that resulted in error",
        ),
        &["backend", "operation"],
    )
    .expect("failed to initialise BACKEND_ERRORS counter")
});

/// Total number of pre-shared key lookups.
pub static PSK_LOOKUP_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "authplug_psk_lookup_count",
            "Total number of pre-shared key lookups",
        ),
        &["found"],
    )
    .expect("failed to initialise PSK_LOOKUP_COUNT counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the decision engine metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    // Skip registration if already done before.
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(AUTHENTICATE_COUNT.clone()),
        Box::new(AUTHORISE_COUNT.clone()),
        Box::new(BACKEND_ERRORS.clone()),
        Box::new(PSK_LOOKUP_COUNT.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}
