//! Reducer-backed store for tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ambit_core::{Listener, Store, Subscription};
use parking_lot::{Mutex, RwLock};

type Reducer<St, A> = dyn Fn(&St, &A) -> St + Send + Sync;
type Listeners = Arc<Mutex<Vec<(u64, Listener)>>>;

/// Store that applies a reducer and records every dispatched action.
///
/// `dispatch` returns the 1-based sequence number of the action. Listeners
/// are notified after the state is replaced, with no lock held.
pub struct RecordingStore<St, A> {
    state: RwLock<Arc<St>>,
    reducer: Box<Reducer<St, A>>,
    actions: Mutex<Vec<A>>,
    listeners: Listeners,
    next_listener: AtomicU64,
}

impl<St, A> RecordingStore<St, A>
where
    St: Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    /// Store starting at `initial`.
    pub fn new(initial: St, reducer: impl Fn(&St, &A) -> St + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(Arc::new(initial)),
            reducer: Box::new(reducer),
            actions: Mutex::new(Vec::new()),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
        })
    }

    /// Every action dispatched so far, in order.
    pub fn actions(&self) -> Vec<A> {
        self.actions.lock().clone()
    }

    /// Replace the state without an action and notify listeners.
    pub fn set_state(&self, state: St) {
        *self.state.write() = Arc::new(state);
        self.notify();
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl<St, A> Store for RecordingStore<St, A>
where
    St: Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    type State = St;
    type Action = A;
    type Dispatched = usize;

    fn state(&self) -> Arc<St> {
        self.state.read().clone()
    }

    fn dispatch(&self, action: A) -> usize {
        {
            let mut state = self.state.write();
            let next = (self.reducer)(&state, &action);
            *state = Arc::new(next);
        }
        let sequence = {
            let mut actions = self.actions.lock();
            actions.push(action);
            actions.len()
        };
        self.notify();
        sequence
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, listener));

        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().retain(|(other, _)| *other != id);
            }
        })
    }
}

impl<St, A: fmt::Debug> fmt::Debug for RecordingStore<St, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingStore")
            .field("actions", &*self.actions.lock())
            .field("listeners", &self.listeners.lock().len())
            .finish_non_exhaustive()
    }
}
