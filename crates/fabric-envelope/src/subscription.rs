//! # Verified Subscription
//!
//! Wraps a transport's raw envelope stream and runs every item through an
//! [`EnvelopeVerifier`] owned by this subscription.

use crate::domain::errors::EnvelopeError;
use crate::domain::verifier::{EnvelopeVerifier, VerifiedEnvelope};
use crate::ports::outbound::{EnvelopeMetrics, EnvelopeStream};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_stream::{Stream, StreamExt};

/// Stream of verified envelopes for one topic.
///
/// Rejections are yielded as `Err` so the caller decides whether to drop,
/// alert or disconnect; the stream keeps going after them.
pub struct VerifiedSubscription {
    topic: String,
    inner: EnvelopeStream,
    verifier: EnvelopeVerifier,
    metrics: Arc<dyn EnvelopeMetrics>,
}

impl VerifiedSubscription {
    pub(crate) fn new(
        topic: String,
        inner: EnvelopeStream,
        verifier: EnvelopeVerifier,
        metrics: Arc<dyn EnvelopeMetrics>,
    ) -> Self {
        Self {
            topic,
            inner,
            verifier,
            metrics,
        }
    }

    /// Subscribed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The verifier holding this subscription's replay windows.
    pub fn verifier(&self) -> &EnvelopeVerifier {
        &self.verifier
    }

    /// Next delivery, or `None` once the transport closes.
    pub async fn recv(&mut self) -> Option<Result<VerifiedEnvelope, EnvelopeError>> {
        self.next().await
    }
}

impl Stream for VerifiedSubscription {
    type Item = Result<VerifiedEnvelope, EnvelopeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let item = match self.inner.as_mut().poll_next(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(None) => return Poll::Ready(None),
            Poll::Ready(Some(item)) => item,
        };

        let result = match item {
            Ok(envelope) => self.verifier.verify(&envelope),
            Err(e) => Err(EnvelopeError::Transport(e.to_string())),
        };
        match &result {
            Ok(verified) => self.metrics.record_accepted(verified.topic()),
            Err(err) => self.metrics.record_rejected(err.reason_label()),
        }
        Poll::Ready(Some(result))
    }
}

impl std::fmt::Debug for VerifiedSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifiedSubscription")
            .field("topic", &self.topic)
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}
