//! Tracing setup for programs embedding the engine
//!
//! The library only emits `tracing` events. A binary driving [`apply_all`]
//! calls [`init`] once at startup to see them.
//!
//! [`apply_all`]: crate::apply_all

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Filter used when `RUST_LOG` is unset: engine decisions at `info`,
/// everything else at `warn`.
pub const DEFAULT_FILTER: &str = "warn,converge_core=info,converge_fs=info,converge_diff=info";

/// Install the global subscriber, filtering by `RUST_LOG` or
/// [`DEFAULT_FILTER`].
///
/// Fails if a global subscriber is already set.
pub fn init() -> Result<(), InitError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => install(filter),
        Err(_) => init_with_filter(DEFAULT_FILTER),
    }
}

/// Install the global subscriber with explicit filter directives, such as
/// `converge_core=debug` to log every diff summary.
pub fn init_with_filter(directives: &str) -> Result<(), InitError> {
    install(EnvFilter::try_new(directives)?)
}

fn install(filter: EnvFilter) -> Result<(), InitError> {
    let fmt_layer = fmt::layer().with_target(true).with_level(true).compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
