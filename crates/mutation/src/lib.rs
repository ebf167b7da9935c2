// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-mutation: edit/add/delete/reset operations on a live action's task
//! graph (§4.5), with transitive downstream invalidation and cooperative
//! cancellation of whatever of that set is in flight.

mod error;
mod mutation;

pub use error::MutationError;
pub use mutation::{MutationConfig, MutationEngine};
