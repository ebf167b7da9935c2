// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-store: the `GraphStore` trait and its in-memory, event-sourced
//! implementation (§4.2).

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use store::{ActionFilter, ClaimToken, GraphStore, TaskOutcome, TaskPatch};
