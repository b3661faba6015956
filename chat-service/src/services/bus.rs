//! In-process publish/subscribe relay for portal events.
//!
//! Consumers run one after another in subscription order. Each call runs
//! inside its own failure boundary: an error or a panic from one consumer is
//! logged and reported, and the remaining consumers still see the event.

use super::metrics;
use crate::models::PortalEvent;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("{0}")]
    Persist(#[from] super::sink::PersistError),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait EventConsumer: Send + Sync {
    /// Label used in logs, metrics, and publish reports.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &PortalEvent) -> Result<(), ConsumerError>;
}

/// A consumer that failed while handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerFailure {
    pub consumer: &'static str,
    pub error: String,
}

/// Outcome of one `publish` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failures: Vec<ConsumerFailure>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
pub struct NotificationBus {
    consumers: RwLock<Vec<Arc<dyn EventConsumer>>>,
}

fn same_consumer(a: &Arc<dyn EventConsumer>, b: &Arc<dyn EventConsumer>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `consumer`. Returns false if this exact consumer is already
    /// subscribed.
    pub fn subscribe(&self, consumer: Arc<dyn EventConsumer>) -> bool {
        let mut consumers = match self.consumers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if consumers.iter().any(|c| same_consumer(c, &consumer)) {
            return false;
        }

        tracing::debug!(consumer = consumer.name(), "Consumer subscribed");
        consumers.push(consumer);
        true
    }

    /// Remove `consumer`. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, consumer: &Arc<dyn EventConsumer>) -> bool {
        let mut consumers = match self.consumers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let before = consumers.len();
        consumers.retain(|c| !same_consumer(c, consumer));
        consumers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        match self.consumers.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Deliver `event` to every current subscriber.
    pub async fn publish(&self, event: &PortalEvent) -> PublishReport {
        // Snapshot so no lock is held across consumer awaits.
        let consumers: Vec<Arc<dyn EventConsumer>> = match self.consumers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        let mut report = PublishReport::default();

        for consumer in consumers {
            let outcome = AssertUnwindSafe(consumer.handle(event))
                .catch_unwind()
                .await;

            let error = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };

            tracing::warn!(
                consumer = consumer.name(),
                event = event.name(),
                session_id = event.session_id().unwrap_or("-"),
                error = %error,
                "Event consumer failed"
            );
            metrics::record_consumer_failure(consumer.name());

            report.failures.push(ConsumerFailure {
                consumer: consumer.name(),
                error,
            });
        }

        report
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("consumer panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("consumer panicked: {}", s)
    } else {
        "consumer panicked".to_string()
    }
}
