//! # Crit Hook
//!
//! Storage-layer I/O failures and decode failures are unrecoverable for a
//! consensus engine: a partially applied decision cannot be rolled back.
//! Components report such failures through a [`Crit`] hook before returning
//! the error. The default hook logs and panics; tests and embedders that
//! prefer to inspect the error install [`Crit::log_only`] or their own hook.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

type Hook = dyn Fn(&dyn Error) + Send + Sync;

/// Shared fatal-error callback.
#[derive(Clone)]
pub struct Crit(Arc<Hook>);

impl Crit {
    pub fn new(hook: impl Fn(&dyn Error) + Send + Sync + 'static) -> Self {
        Crit(Arc::new(hook))
    }

    /// Logs the failure and panics.
    pub fn fatal() -> Self {
        Crit::new(|err| {
            tracing::error!(error = %err, "critical storage failure");
            panic!("critical storage failure: {err}");
        })
    }

    /// Logs the failure and lets the caller propagate it.
    pub fn log_only() -> Self {
        Crit::new(|err| tracing::error!(error = %err, "critical storage failure"))
    }

    pub fn report(&self, err: &dyn Error) {
        (self.0)(err)
    }
}

impl Default for Crit {
    fn default() -> Self {
        Crit::fatal()
    }
}

impl fmt::Debug for Crit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Crit")
    }
}
