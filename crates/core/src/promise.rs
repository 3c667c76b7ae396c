//! Single assignment promises.
//!
//! A [Promise] is resolved at most once through its [Resolver]. Resolving twice is a
//! no-op, so a dispatch callback and a timeout may race to resolve the same promise.
//! A promise whose resolvers are all dropped resolves to `None`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::task::Context;
use std::task::Poll;

use tokio::sync::oneshot;

/// The waiting side, awaits to `Some(value)` or `None` on timeout or abandonment.
#[derive(Debug)]
pub struct Promise<T> {
    rx: oneshot::Receiver<Option<T>>,
}

/// The resolving side of a [Promise]. Cloning shares the same slot.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: Arc<Mutex<Option<oneshot::Sender<Option<T>>>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Promise<T> {
    /// Create an unresolved promise and its resolver.
    pub fn pending() -> (Promise<T>, Resolver<T>) {
        let (tx, rx) = oneshot::channel();
        (Promise { rx }, Resolver {
            tx: Arc::new(Mutex::new(Some(tx))),
        })
    }

    /// A promise already resolved to `value`.
    pub fn ready(value: Option<T>) -> Promise<T> {
        let (promise, resolver) = Self::pending();
        resolver.resolve(value);
        promise
    }
}

impl<T> Resolver<T> {
    /// Resolve the promise, returns false if it was already resolved.
    pub fn resolve(&self, value: Option<T>) -> bool {
        let Ok(mut slot) = self.tx.lock() else {
            return false;
        };
        match slot.take() {
            Some(tx) => {
                // The promise may have been dropped, it is still resolved.
                let _ = tx.send(value);
                true
            }
            None => false,
        }
    }

    /// Whether the promise has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.tx.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }
}

impl<T> Future for Promise<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.ok().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_once() {
        let (promise, resolver) = Promise::pending();
        let other = resolver.clone();
        assert!(resolver.resolve(Some(1)));
        assert!(!other.resolve(Some(2)));
        assert!(!resolver.resolve(None));
        assert!(other.is_resolved());
        assert_eq!(promise.await, Some(1));
    }

    #[tokio::test]
    async fn test_abandoned_promise_resolves_to_none() {
        let (promise, resolver) = Promise::<u8>::pending();
        drop(resolver);
        assert_eq!(promise.await, None);
        assert_eq!(Promise::ready(Some(3)).await, Some(3));
    }
}
