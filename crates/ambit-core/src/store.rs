//! Narrow interface to the application store.
//!
//! The store (reducer, dispatch semantics, middleware) lives outside this
//! crate. A controller only needs to read the current state, dispatch actions
//! and hear about changes.

use std::fmt;
use std::sync::Arc;

/// Change listener registered with a [`Store`].
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Application store consumed by controllers.
///
/// Implementations must not hold internal locks while notifying listeners:
/// listeners call [`Store::state`] to recompute their selectors.
pub trait Store: Send + Sync + 'static {
    /// Global state the selectors read.
    type State: Send + Sync + 'static;
    /// Action accepted by [`Store::dispatch`].
    type Action: Send + 'static;
    /// Whatever `dispatch` hands back; controller methods resume with it.
    type Dispatched: Send + 'static;

    /// Current state snapshot.
    fn state(&self) -> Arc<Self::State>;

    /// Dispatch an action. This is the only mutation path into global state.
    fn dispatch(&self, action: Self::Action) -> Self::Dispatched;

    /// Register a listener called after every state change.
    fn subscribe(&self, listener: Listener) -> Subscription;
}

/// Handle that unsubscribes its listener when dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Subscription that runs `cancel` when dropped.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Unsubscribe now.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
