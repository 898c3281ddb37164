//! Mounted controller instances.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::ControllerConfig;
use crate::context::Context;
use crate::engine::{BoundMethod, Invocation, MethodTable};
use crate::errors::{SelectorError, ViewError};
use crate::prop_types::{PropTypes, Provided};
use crate::props::{Args, PropMap, Props, PropsGetter};
use crate::selector::CompositeSelector;
use crate::store::{Store, Subscription};
use crate::view::View;

/// State shared between an instance, its store listener and its props getter.
pub(crate) struct Shared<S: Store> {
    pub(crate) name: String,
    store: Arc<S>,
    own: Arc<PropMap>,
    selector: CompositeSelector<S::State>,
    prop_types: PropTypes,
    config: ControllerConfig,
    props: RwLock<Props<S>>,
    revision: watch::Sender<u64>,
}

impl<S: Store> Shared<S> {
    pub(crate) fn new(
        name: String,
        store: Arc<S>,
        own: Arc<PropMap>,
        selected: PropMap,
        selector: CompositeSelector<S::State>,
        prop_types: PropTypes,
        config: ControllerConfig,
    ) -> Self {
        let props = Props::new(own.clone(), Arc::new(selected), store.clone());
        let (revision, _) = watch::channel(0);
        Self {
            name,
            store,
            own,
            selector,
            prop_types,
            config,
            props: RwLock::new(props),
            revision,
        }
    }

    pub(crate) fn props(&self) -> Props<S> {
        self.props.read().clone()
    }

    /// Recompute the selector output; `Ok(false)` when nothing changed.
    pub(crate) fn refresh(&self) -> Result<bool, SelectorError> {
        let state = self.store.state();
        let selected = self.selector.select(&state)?;

        let props = {
            let mut current = self.props.write();
            if self.config.skip_unchanged && current.selected() == &selected {
                return Ok(false);
            }
            *current = Props::new(self.own.clone(), Arc::new(selected), self.store.clone());
            current.clone()
        };

        self.check_prop_types(&props);
        self.revision.send_modify(|revision| *revision += 1);
        debug!(
            controller = %self.name,
            revision = *self.revision.borrow(),
            "Refreshed controller props"
        );
        Ok(true)
    }

    /// Log every declared field whose value does not match its descriptor.
    pub(crate) fn check_prop_types(&self, props: &Props<S>) {
        if !self.config.check_prop_types {
            return;
        }
        for (field, prop_type) in self.prop_types.iter() {
            if let Err(error) = prop_type.check(&self.name, field, props.get(field).map(Provided::Value)) {
                warn!(controller = %self.name, %error, "Prop type mismatch");
            }
        }
    }
}

/// A controller mounted against a store.
///
/// Tearing down (through [`unmount`](Self::unmount) or by dropping) cancels
/// the store subscription and starts `deinitialize` once. Invocations still in
/// flight keep running and see the last props snapshot.
pub struct ControllerInstance<S: Store, V> {
    root: Arc<V>,
    shared: Arc<Shared<S>>,
    methods: Arc<MethodTable>,
    subscription: Option<Subscription>,
    initialization: Option<Invocation>,
    torn_down: bool,
}

impl<S: Store, V: View> ControllerInstance<S, V> {
    pub(crate) fn new(
        root: Arc<V>,
        shared: Arc<Shared<S>>,
        methods: Arc<MethodTable>,
        subscription: Subscription,
        initialization: Option<Invocation>,
    ) -> Self {
        Self {
            root,
            shared,
            methods,
            subscription: Some(subscription),
            initialization,
            torn_down: false,
        }
    }

    /// Render the root view with its own props and the current context.
    pub fn render(&self) -> Result<V::Output, ViewError> {
        self.context().render(&*self.root, &self.shared.own)
    }

    /// Current ambient context.
    pub fn context(&self) -> Context {
        let values = self.shared.props.read().selected_arc().clone();
        let revision = *self.shared.revision.borrow();
        Context::new(values, self.methods.clone(), revision)
    }

    /// Current props snapshot.
    pub fn props(&self) -> Props<S> {
        self.shared.props()
    }

    /// Getter that always returns the current props.
    pub fn props_getter(&self) -> PropsGetter<S> {
        let shared = self.shared.clone();
        PropsGetter::new(move || shared.props())
    }

    /// Bound method by name.
    pub fn method(&self, name: &str) -> Option<&BoundMethod> {
        self.methods.get(name)
    }

    /// Every bound method.
    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// Recompute the selector output now.
    pub fn refresh(&self) -> Result<bool, SelectorError> {
        self.shared.refresh()
    }

    /// Revision counter, bumped on every props change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Take the handle of the `initialize` invocation, if one was started.
    pub fn take_initialization(&mut self) -> Option<Invocation> {
        self.initialization.take()
    }

    /// Label used in diagnostics.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Tear down now, returning the `deinitialize` invocation if there is one.
    pub fn unmount(mut self) -> Option<Invocation> {
        self.teardown()
    }
}

impl<S: Store, V> ControllerInstance<S, V> {
    fn teardown(&mut self) -> Option<Invocation> {
        if self.torn_down {
            return None;
        }
        self.torn_down = true;
        self.subscription.take();

        debug!(controller = %self.shared.name, "Unmounting controller");
        self.methods
            .get("deinitialize")
            .map(|deinitialize| deinitialize.spawn(Args::new()))
    }
}

impl<S: Store, V> Drop for ControllerInstance<S, V> {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

impl<S: Store, V> fmt::Debug for ControllerInstance<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerInstance")
            .field("name", &self.shared.name)
            .field("methods", &self.methods.names().collect::<Vec<_>>())
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}
