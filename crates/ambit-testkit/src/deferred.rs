//! Awaitables resolved by hand.
//!
//! Controller methods suspend on a [`Pending`]; the test decides when (and
//! in which order) the matching [`Resolver`]s fire.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use ambit_core::MethodError;
use futures::channel::oneshot;
use parking_lot::Mutex;

/// Settles the paired [`Pending`].
#[derive(Debug)]
pub struct Resolver<T> {
    sender: oneshot::Sender<Result<T, MethodError>>,
}

impl<T> Resolver<T> {
    /// Resolve with a value.
    pub fn resolve(self, value: T) {
        let _ = self.sender.send(Ok(value));
    }

    /// Reject with a failure.
    pub fn reject(self, error: MethodError) {
        let _ = self.sender.send(Err(error));
    }
}

/// Future that completes when its [`Resolver`] fires.
///
/// Dropping the resolver unsettled rejects with a message error.
#[derive(Debug)]
pub struct Pending<T> {
    receiver: oneshot::Receiver<Result<T, MethodError>>,
}

impl<T> Future for Pending<T> {
    type Output = Result<T, MethodError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|settled| settled.unwrap_or_else(|_| Err(MethodError::msg("deferred was dropped"))))
    }
}

/// Create a resolver and its pending future.
pub fn deferred<T>() -> (Resolver<T>, Pending<T>) {
    let (sender, receiver) = oneshot::channel();
    (Resolver { sender }, Pending { receiver })
}

/// Queue of pending futures handed out in creation order.
///
/// Method bodies are called once per invocation, so a test queues one
/// deferred per expected call and the body takes the next one.
pub struct Deferreds<T> {
    queue: Arc<Mutex<VecDeque<Pending<T>>>>,
}

impl<T> Deferreds<T> {
    /// Empty queue.
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queue a new pending future and return its resolver.
    pub fn defer(&self) -> Resolver<T> {
        let (resolver, pending) = deferred();
        self.queue.lock().push_back(pending);
        resolver
    }

    /// Take the oldest queued future; rejects at once when none is queued.
    pub fn take(&self) -> Pending<T> {
        match self.queue.lock().pop_front() {
            Some(pending) => pending,
            None => {
                let (resolver, pending) = deferred();
                resolver.reject(MethodError::msg("no deferred queued"));
                pending
            }
        }
    }

    /// Number of futures not yet taken.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether every queued future was taken.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl<T> Clone for Deferreds<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<T> Default for Deferreds<T> {
    fn default() -> Self {
        Self::new()
    }
}
