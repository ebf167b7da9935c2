// SPDX-License-Identifier: MIT

//! The in-process event bus (§4.1): per-action topic, FIFO per subscriber,
//! bounded queues, snapshot-on-subscribe, drop-oldest-with-marker overflow.

use orc_core::config::{self, FileOrchestratorConfig};
use orc_core::{ActionId, Clock, Event};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const DEFAULT_CAPACITY: usize = 256;

struct SubscriberInner {
    events: VecDeque<Event>,
    /// Count of events dropped since the last time a marker was delivered.
    /// Materialized into an `Event::Lag` the next time the subscriber polls,
    /// coalescing any number of consecutive drops into one counter.
    lag: Option<u32>,
    closed: bool,
}

struct Subscriber {
    id: u64,
    action_id: ActionId,
    capacity: usize,
    inner: Mutex<SubscriberInner>,
    notify: Notify,
}

impl Subscriber {
    /// Non-blocking publish into this subscriber's queue. Never blocks the
    /// publisher regardless of how slow this subscriber is draining.
    fn push(&self, event: Event) {
        let mut inner = self.inner.lock();
        if inner.events.len() < self.capacity {
            inner.events.push_back(event);
        } else {
            inner.events.pop_front();
            inner.events.push_back(event);
            *inner.lag.get_or_insert(0) += 1;
        }
        drop(inner);
        self.notify.notify_one();
    }

    fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        drop(inner);
        self.notify.notify_waiters();
    }
}

struct Inner {
    subscribers: Mutex<HashMap<ActionId, Vec<Arc<Subscriber>>>>,
    capacity: usize,
    next_id: AtomicU64,
}

/// A process-local publish/subscribe fabric, one logical topic per action id.
///
/// Cheap to clone: internally `Arc`-backed, so every component that needs to
/// publish or subscribe holds its own handle onto the same fabric.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: Mutex::new(HashMap::new()),
                capacity,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Build a bus with its per-subscriber ring capacity resolved from
    /// config (§6's `ORC_EVENT_QUEUE_CAPACITY`), the same
    /// env-then-file-then-default precedence `ExecutorConfig::from_file`
    /// and `MutationConfig::from_file` apply to their own options.
    pub fn from_file(file: &FileOrchestratorConfig) -> Self {
        Self::new(config::event_queue_capacity(file))
    }

    /// The keepalive cadence [`EventBus::spawn_keepalive`] should be called
    /// with, resolved from config (§6's `ORC_PING_INTERVAL_SECONDS`).
    pub fn keepalive_interval(file: &FileOrchestratorConfig) -> Duration {
        config::ping_interval(file)
    }

    /// Subscribe to `action_id`'s event stream. `snapshot` builds the first
    /// event delivered (typically `Event::Snapshot`), constructed under the
    /// same registration so no publish can race ahead of it.
    pub fn subscribe(&self, action_id: ActionId, snapshot: Event) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber {
            id,
            action_id,
            capacity: self.inner.capacity,
            inner: Mutex::new(SubscriberInner {
                events: VecDeque::from([snapshot]),
                lag: None,
                closed: false,
            }),
            notify: Notify::new(),
        });
        self.inner
            .subscribers
            .lock()
            .entry(action_id)
            .or_default()
            .push(subscriber.clone());
        Subscription {
            bus: self.clone(),
            subscriber,
        }
    }

    /// Enqueue `event` for every current subscriber of `action_id`.
    /// Non-blocking for the publisher.
    pub fn publish(&self, action_id: ActionId, event: Event) {
        let subs = self.inner.subscribers.lock();
        if let Some(list) = subs.get(&action_id) {
            for sub in list {
                sub.push(event.clone());
            }
        }
    }

    /// Number of live subscribers for `action_id`, for diagnostics/tests.
    pub fn subscriber_count(&self, action_id: ActionId) -> usize {
        self.inner
            .subscribers
            .lock()
            .get(&action_id)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    fn unsubscribe(&self, action_id: ActionId, id: u64) {
        let mut subs = self.inner.subscribers.lock();
        if let Some(list) = subs.get_mut(&action_id) {
            list.retain(|s| s.id != id);
            if list.is_empty() {
                subs.remove(&action_id);
            }
        }
    }

    /// Spawn a background task that publishes `Event::Ping` on `action_id`
    /// every `interval`, keeping a transport-layer stream alive. Aborts the
    /// returned handle to stop. `clock` stamps each ping with the wall-clock
    /// time it was sent (§6's `ping` event carries a real `ts`).
    pub fn spawn_keepalive<C: Clock + 'static>(
        &self,
        action_id: ActionId,
        interval: Duration,
        clock: C,
    ) -> tokio::task::JoinHandle<()> {
        let bus = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if bus.subscriber_count(action_id) == 0 {
                    break;
                }
                bus.publish(action_id, Event::Ping { ts_ms: clock.epoch_ms() });
            }
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A handle delivering future events for one action's topic. `recv` yields
/// events in publish order (the loader's snapshot first); dropping (or
/// calling [`Subscription::close`]) releases the subscriber from the bus.
pub struct Subscription {
    bus: EventBus,
    subscriber: Arc<Subscriber>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            {
                let mut inner = self.subscriber.inner.lock();
                if let Some(dropped) = inner.lag.take() {
                    return Some(Event::Lag {
                        action_id: self.subscriber.action_id,
                        dropped,
                    });
                }
                if let Some(event) = inner.events.pop_front() {
                    return Some(event);
                }
                if inner.closed {
                    return None;
                }
            }
            self.subscriber.notify.notified().await;
        }
    }

    /// Release this subscription's resources. Equivalent to dropping it.
    pub fn close(self) {
        // Drop runs the cleanup.
    }

    pub fn action_id(&self) -> ActionId {
        self.subscriber.action_id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.subscriber.close();
        self.bus.unsubscribe(self.subscriber.action_id, self.subscriber.id);
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
