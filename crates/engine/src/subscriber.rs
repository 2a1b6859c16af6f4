// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscribers and the registry the dispatcher fans out to

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use stately_core::{Actor, StateLogEntry};
use std::sync::{Arc, RwLock};

/// A committed state change as seen by subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateEvent {
    pub log_id: u64,
    pub entity_type: String,
    pub entity_id: u64,
    pub previous: Option<String>,
    pub next: String,
    pub actor: Actor,
    pub at: DateTime<Utc>,
}

impl StateEvent {
    /// Name matched against subscription patterns: `entity_type:next`
    pub fn name(&self) -> String {
        format!("{}:{}", self.entity_type, self.next)
    }
}

impl From<&StateLogEntry> for StateEvent {
    fn from(entry: &StateLogEntry) -> Self {
        Self {
            log_id: entry.id,
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id,
            previous: entry.old_state.clone(),
            next: entry.new_state.clone(),
            actor: entry.actor.clone(),
            at: entry.created_at,
        }
    }
}

/// A subscriber's verdict on one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Accept,
    /// The event should be retried later
    Reject(String),
}

#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn deliver(&self, event: &StateEvent) -> Delivery;
}

/// Subscriber backed by a plain closure
pub struct FnSubscriber<F> {
    name: String,
    f: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&StateEvent) -> Delivery + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(&StateEvent) -> Delivery + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, event: &StateEvent) -> Delivery {
        (self.f)(event)
    }
}

/// Pattern for matching event names
///
/// Supports:
///   - Exact: "order:paid"
///   - Single wildcard: "order:*" matches every state of `order`
///   - Rest wildcard: "**" matches everything remaining
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventPattern(String);

impl EventPattern {
    pub fn new(pattern: &str) -> Self {
        Self(pattern.to_string())
    }

    pub fn matches(&self, event_name: &str) -> bool {
        if self.0.is_empty() {
            return false;
        }
        if self.0 == "*" || self.0 == "**" {
            return true;
        }

        let pattern_parts: Vec<&str> = self.0.split(':').collect();
        let event_parts: Vec<&str> = event_name.split(':').collect();
        Self::match_segments(&pattern_parts, &event_parts)
    }

    fn match_segments(pattern: &[&str], event: &[&str]) -> bool {
        match (pattern.first(), event.first()) {
            (None, None) => true,
            (Some(&"**"), _) => true,
            (Some(&"*"), Some(_)) => Self::match_segments(&pattern[1..], &event[1..]),
            (Some(p), Some(e)) if *p == *e => Self::match_segments(&pattern[1..], &event[1..]),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub String);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which events a subscriber receives
#[derive(Clone, Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub patterns: Vec<EventPattern>,
    pub description: String,
}

impl Subscription {
    pub fn new(
        id: impl Into<String>,
        patterns: Vec<EventPattern>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: SubscriberId(id.into()),
            patterns,
            description: description.into(),
        }
    }

    /// Subscription to every event
    pub fn all(id: impl Into<String>) -> Self {
        Self::new(id, vec![EventPattern::new("**")], "all state changes")
    }

    pub fn matches(&self, event_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(event_name))
    }
}

type Entry = (Subscription, Arc<dyn Subscriber>);

/// Shared, mutable set of subscriptions
///
/// Clones share the same registry, so subscribers registered after the
/// dispatcher started are picked up on the next entry.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber, replacing any registered under the same id
    pub fn register(&self, subscription: Subscription, subscriber: Arc<dyn Subscriber>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|(s, _)| s.id != subscription.id);
        tracing::debug!(id = %subscription.id, subscriber = subscriber.name(), "registered");
        entries.push((subscription, subscriber));
    }

    pub fn register_fn<F>(&self, id: &str, patterns: &[&str], f: F)
    where
        F: Fn(&StateEvent) -> Delivery + Send + Sync + 'static,
    {
        let subscription = Subscription::new(
            id,
            patterns.iter().map(|p| EventPattern::new(p)).collect(),
            "",
        );
        self.register(subscription, Arc::new(FnSubscriber::new(id, f)));
    }

    pub fn unregister(&self, id: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(s, _)| s.id.0 != id);
        entries.len() != before
    }

    /// Subscribers whose subscription matches `event_name`, in registration order
    pub fn matching(&self, event_name: &str) -> Vec<Arc<dyn Subscriber>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|(s, _)| s.matches(event_name))
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect()
    }

    pub fn ids(&self) -> Vec<SubscriberId> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().map(|(s, _)| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
