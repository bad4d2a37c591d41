use async_trait::async_trait;
use tracing::Instrument;

use crate::errors::Result;
use crate::resolver::{Resolve, ResolvedLocation};

const DEFAULT_SPAN_NAME: &str = "resolve";

/// Wraps a resolver and opens a span around each call when tracing is enabled.
///
/// With tracing disabled calls are forwarded as-is. Results are never changed.
#[derive(Debug, Clone)]
pub struct TracedResolver<R> {
    inner: R,
    enabled: bool,
    operation: &'static str,
}

impl<R: Resolve> TracedResolver<R> {
    pub fn new(inner: R, enabled: bool) -> Self {
        Self {
            inner,
            enabled,
            operation: DEFAULT_SPAN_NAME,
        }
    }

    /// Name recorded as the span's `operation` field.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        self.operation = operation;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[async_trait]
impl<R: Resolve> Resolve for TracedResolver<R> {
    async fn resolve(&self, reference: &str) -> Result<ResolvedLocation> {
        if !self.enabled {
            return self.inner.resolve(reference).await;
        }

        let span = tracing::info_span!(
            "resolve",
            operation = self.operation,
            reference = %reference,
            outcome = tracing::field::Empty,
        );
        let outcome = self
            .inner
            .resolve(reference)
            .instrument(span.clone())
            .await;

        match &outcome {
            Ok(resolved) => span.record("outcome", resolved.kind().to_string().as_str()),
            Err(err) => span.record("outcome", err.kind()),
        };
        outcome
    }
}
