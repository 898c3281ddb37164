//! In-memory store for the browser.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ambit_core::{Listener, Store, Subscription};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::state::{reduce, Action, AppState};

type Listeners = Arc<Mutex<Vec<(u64, Listener)>>>;

/// Reducer-backed store that logs every action with before/after summaries.
pub struct AppStore {
    state: RwLock<Arc<AppState>>,
    listeners: Listeners,
    next_listener: AtomicU64,
}

impl AppStore {
    /// Store starting from `initial`.
    pub fn new(initial: AppState) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(Arc::new(initial)),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
        })
    }
}

impl Store for AppStore {
    type State = AppState;
    type Action = Action;
    type Dispatched = Action;

    fn state(&self) -> Arc<AppState> {
        self.state.read().clone()
    }

    fn dispatch(&self, action: Action) -> Action {
        let (prev, next) = {
            let mut state = self.state.write();
            let prev = state.clone();
            *state = Arc::new(reduce(&prev, &action));
            (prev, state.clone())
        };
        debug!(
            ?action,
            prev = %prev.summary(),
            next = %next.summary(),
            "Dispatched action"
        );

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
        action
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
