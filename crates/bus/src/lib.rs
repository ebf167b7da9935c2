// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-bus: the in-process event bus (§4.1) — per-action topic, FIFO
//! per-subscriber delivery, bounded queues, snapshot-on-subscribe, and
//! drop-oldest-with-marker overflow.

mod bus;

pub use bus::{EventBus, Subscription};
