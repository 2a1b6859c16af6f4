// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stately-storage: durable store for definitions, rows, the state log and
//! process locks

mod error;
mod operation;
mod overlay;
mod state;
mod store;
mod wal;
mod wal_store;

pub use error::StoreError;
pub use operation::Operation;
pub use state::{MaterializedState, RowKey};
pub use store::{RowDraft, Store, Transaction};
pub use wal::{Wal, WalEntry};
pub use wal_store::{WalStore, LOCK_FILE, WAL_FILE};
