#![warn(missing_docs)]
//! Correlation of inbound messages with the code waiting for them.
//!
//! Every subscription is filed under a [CorrelationKey] and carries a [Lifetime]:
//!
//! * [Lifetime::Permanent] receives every matching message and stays registered.
//! * [Lifetime::Once] is removed by the first matching message.
//! * [Lifetime::Timeout] is removed by the first matching message, or by its timer.
//!
//! A non-permanent subscription is always removed from the table before its callback
//! runs, and only the party that removed it may invoke it. A timeout subscription thus
//! gets exactly one of [Subscriber::notify] and [Subscriber::on_timeout].
//!
//! Callbacks never run on the caller of [Dispatch::publish]. They are spawned as tokio
//! tasks gated by a semaphore, which bounds how many run at the same time.

use std::future::Future;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::message::CorrelationKey;
use crate::message::MessagePayload;

/// How long a subscription stays registered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lifetime {
    /// Until [Dispatch::unsubscribe] or [Dispatch::clear].
    Permanent,
    /// Until the first matching message.
    Once,
    /// Until the first matching message, or until the duration elapses.
    Timeout(Duration),
}

/// Callback side of a subscription.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Invoked with a matching message.
    async fn notify(&self, payload: &MessagePayload) -> Result<()>;

    /// Invoked when a [Lifetime::Timeout] subscription expires without a match.
    async fn on_timeout(&self) -> Result<()> {
        Ok(())
    }
}

/// A subscriber shared between dispatch and its owner.
pub type SharedSubscriber = Arc<dyn Subscriber>;

/// A registered subscription, returned by [Dispatch::subscribe] as a handle for
/// [Dispatch::unsubscribe].
pub struct Subscription {
    id: u64,
    key: CorrelationKey,
    lifetime: Lifetime,
    subscriber: SharedSubscriber,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// The keyed publish/subscribe correlator. Cloning shares the same table.
#[derive(Clone)]
pub struct Dispatch {
    inner: Arc<DispatchInner>,
}

struct DispatchInner {
    subscriptions: DashMap<CorrelationKey, Vec<Arc<Subscription>>>,
    next_id: AtomicU64,
    workers: Arc<Semaphore>,
}

impl Dispatch {
    /// Create a dispatch running at most `worker_pool_size` callbacks concurrently.
    pub fn new(worker_pool_size: usize) -> Self {
        Self {
            inner: Arc::new(DispatchInner {
                subscriptions: DashMap::new(),
                next_id: AtomicU64::new(0),
                workers: Arc::new(Semaphore::new(worker_pool_size.max(1))),
            }),
        }
    }

    /// Register `subscriber` under `key`.
    /// A [Lifetime::Timeout] subscription also arms its expiry timer.
    pub fn subscribe(
        &self,
        key: CorrelationKey,
        lifetime: Lifetime,
        subscriber: SharedSubscriber,
    ) -> Arc<Subscription> {
        let subscription = Arc::new(Subscription {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            key,
            lifetime,
            subscriber,
        });
        self.inner
            .subscriptions
            .entry(key)
            .or_default()
            .push(subscription.clone());
        tracing::debug!("Subscribe {:?} on {}", lifetime, key);

        if let Lifetime::Timeout(delay) = lifetime {
            let dispatch = self.clone();
            let expired = subscription.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if dispatch.unsubscribe(&expired) {
                    tracing::debug!("Subscription on {} timed out", expired.key);
                    dispatch.spawn_worker(async move { expired.subscriber.on_timeout().await });
                }
            });
        }

        subscription
    }

    /// Deliver `payload` to every subscription under its correlation key.
    /// Returns the number of callbacks scheduled; zero means nobody was waiting.
    pub fn publish(&self, payload: MessagePayload) -> usize {
        let key = payload.correlation_key();
        let matched = match self.inner.subscriptions.get_mut(&key) {
            Some(mut entry) => {
                let (permanent, consumed): (Vec<_>, Vec<_>) = entry
                    .drain(..)
                    .partition(|s| s.lifetime == Lifetime::Permanent);
                *entry = permanent.clone();
                permanent.into_iter().chain(consumed).collect::<Vec<_>>()
            }
            None => vec![],
        };
        self.inner
            .subscriptions
            .remove_if(&key, |_, subs| subs.is_empty());

        if matched.is_empty() {
            tracing::warn!(
                "No subscriber waiting for {} from {}, drop it",
                key,
                payload.sender
            );
            return 0;
        }

        let payload = Arc::new(payload);
        for subscription in matched.iter().cloned() {
            let payload = payload.clone();
            self.spawn_worker(async move { subscription.subscriber.notify(&payload).await });
        }
        matched.len()
    }

    /// Remove `subscription`, returns whether it was still registered.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let removed = match self.inner.subscriptions.get_mut(&subscription.key) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|s| s.id != subscription.id);
                entry.len() != before
            }
            None => false,
        };
        if removed {
            self.inner
                .subscriptions
                .remove_if(&subscription.key, |_, subs| subs.is_empty());
        }
        removed
    }

    /// Drop every subscription. Pending timers become no-ops.
    pub fn clear(&self) {
        self.inner.subscriptions.clear();
    }

    /// Number of subscriptions registered under `key`.
    pub fn subscription_count(&self, key: &CorrelationKey) -> usize {
        self.inner
            .subscriptions
            .get(key)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    fn spawn_worker<F>(&self, task: F)
    where F: Future<Output = Result<()>> + Send + 'static {
        let workers = self.inner.workers.clone();
        tokio::spawn(async move {
            let Ok(_permit) = workers.acquire_owned().await else {
                tracing::warn!("Dispatch worker pool is closed, drop callback");
                return;
            };
            if let Err(e) = task.await {
                tracing::error!("Subscriber failed: {e}");
            }
        });
    }
}
