/*!

A thin wrapper around `tracing` giving the engine the same leveled-verbosity logging macros Maude-
and E-style engines expose (`-V` verbosity levels), without committing call sites to a particular
backend. `init_logging()` installs a `tracing_subscriber` formatter once per process; tests that want
visible output can call it at the top of the test.

*/

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a default `tracing_subscriber` formatting layer reading verbosity from `RUST_LOG`.
/// Idempotent: safe to call from every test that wants logs.
pub fn init_logging() {
  INIT.call_once(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
  });
}

#[macro_export]
macro_rules! critical {
  ($($arg:tt)*) => { $crate::tracing::error!(target: "eqsat::critical", $($arg)*) };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => { $crate::tracing::error!($($arg)*) };
}

#[macro_export]
macro_rules! warning {
  ($level:expr, $($arg:tt)*) => { $crate::tracing::warn!(verbosity = $level, $($arg)*) };
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => { $crate::tracing::info!($($arg)*) };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => { $crate::tracing::debug!($($arg)*) };
}

#[macro_export]
macro_rules! trace {
  ($($arg:tt)*) => { $crate::tracing::trace!($($arg)*) };
}

pub use crate::{critical, error, warning, info, debug, trace};
