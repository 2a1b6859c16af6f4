// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced subscriber wrapper for consistent observability

use crate::subscriber::{Delivery, StateEvent, Subscriber};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any Subscriber
#[derive(Clone)]
pub struct TracedSubscriber<S> {
    inner: S,
}

impl<S> TracedSubscriber<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: Subscriber> Subscriber for TracedSubscriber<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn deliver(&self, event: &StateEvent) -> Delivery {
        let span = tracing::info_span!(
            "subscriber.deliver",
            subscriber = self.inner.name(),
            log_id = event.log_id,
            event = %event.name(),
        );

        async {
            let start = std::time::Instant::now();
            let result = self.inner.deliver(event).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Delivery::Accept => tracing::debug!(elapsed_ms, "accepted"),
                Delivery::Reject(reason) => tracing::warn!(elapsed_ms, reason = %reason, "rejected"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
