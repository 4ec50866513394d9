//! Telemetry utilities for operation timing and tracing spans.

use std::time::Instant;

/// Guard for timing an operation and recording metrics.
///
/// Records operation latency when dropped.
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    /// Start timing an operation.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_operation(self.operation, duration);
    }
}

/// Standardized span constructors for authorization observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for one boundary request.
    pub fn request(request_id: &str, operation: &str) -> Span {
        info_span!("request", id = %request_id, operation = %operation)
    }

    /// Create a span for an admin-mutation operation.
    pub fn mutation(operation: &str, actor: i64, organization: i64) -> Span {
        info_span!("mutation", operation = %operation, actor = %actor, organization = %organization)
    }
}
