// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stately-engine: guarded mutations, locks and dispatch
//!
//! Everything here runs against a [`stately_storage::Store`]:
//! - [`StatefulGuard`] validates and records state changes
//! - [`DistributedLock`] elects a single holder per lock name
//! - [`Dispatcher`] fans committed state changes out to subscribers

mod cache;
mod dispatcher;
mod error;
mod events;
mod guard;
mod lock;
mod subscriber;
mod traced;

pub use cache::DefinitionCache;
pub use dispatcher::{BatchOutcome, Dispatcher, DispatcherHandle, DispatcherState, RunSummary};
pub use error::{DispatchError, GuardError};
pub use events::log_event;
pub use guard::{Committed, StatefulGuard};
pub use lock::DistributedLock;
pub use subscriber::{
    Delivery, EventPattern, FnSubscriber, StateEvent, Subscriber, SubscriberId,
    SubscriberRegistry, Subscription,
};
pub use traced::TracedSubscriber;
