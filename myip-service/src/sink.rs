//! Error sinks for non-fatal errors.

use tracing::{error, warn};

use myip_core::error::MyipError;
use myip_core::traits::ErrorSink;

/// Sink that logs every report through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, err: &MyipError) {
        if err.is_recoverable() {
            warn!(error = %err, "Degraded request");
        } else {
            error!(error = %err, "Request error");
        }
    }
}
