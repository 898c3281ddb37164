//! Controller construction and mounting.

use std::fmt;
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::instance::{ControllerInstance, Shared};
use super::methods::ControllerMethods;
use crate::config::ControllerConfig;
use crate::engine::{Engine, MethodTable, Namespace};
use crate::errors::ControllerError;
use crate::prop_types::{PropType, PropTypes};
use crate::props::{Args, PropMap, PropsGetter};
use crate::selector::{aggregate, merge_bundles, CompositeSelector, SelectorBundle};
use crate::store::{Listener, Store};
use crate::view::View;

/// Wraps a root view with selectors and controller methods.
///
/// The composite selector is computed once here; every instance mounted
/// from this controller shares it.
pub struct Controller<S: Store, V> {
    root: Arc<V>,
    methods: ControllerMethods<S>,
    selector: CompositeSelector<S::State>,
    engine: Engine<S>,
    config: ControllerConfig,
}

impl<S: Store, V: View> Controller<S, V> {
    /// Build a controller. Bundles are merged in order, later names winning.
    pub fn new(
        root: V,
        methods: ControllerMethods<S>,
        bundles: impl IntoIterator<Item = SelectorBundle<S::State>>,
    ) -> Self {
        Self {
            root: Arc::new(root),
            methods,
            selector: aggregate(merge_bundles(bundles)),
            engine: Engine::default(),
            config: ControllerConfig::default(),
        }
    }

    /// Use a different engine, typically one with a custom interpreter.
    #[must_use]
    pub fn with_engine(mut self, engine: Engine<S>) -> Self {
        self.engine = engine;
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Composite selector shared by every instance.
    pub fn selector(&self) -> &CompositeSelector<S::State> {
        &self.selector
    }

    /// Method definitions.
    pub fn methods(&self) -> &ControllerMethods<S> {
        &self.methods
    }

    /// Prop contract: selector descriptors overlaid with the root's own.
    pub fn prop_types(&self) -> PropTypes {
        let mut types = self.selector.prop_types().clone();
        types.extend(&self.root.prop_types());
        types
    }

    /// Ambient contract: every selector plus a required function per method.
    pub fn context_types(&self) -> PropTypes {
        let mut types = self.selector.prop_types().clone();
        for name in self.methods.names() {
            types.insert(name, PropType::func().required());
        }
        types
    }

    /// Mount against `store` with the root's own props.
    ///
    /// Must be called inside a Tokio runtime; suspended methods continue as
    /// tasks on it. `initialize` starts before this returns but is not
    /// awaited.
    pub fn mount(&self, store: Arc<S>, own: PropMap) -> Result<ControllerInstance<S, V>, ControllerError> {
        if Handle::try_current().is_err() {
            return Err(ControllerError::NoRuntime);
        }

        let name = self
            .config
            .name
            .clone()
            .unwrap_or_else(|| self.root.name().to_string());
        let selected = self.selector.select(&store.state())?;

        let shared = Arc::new(Shared::new(
            name,
            store.clone(),
            Arc::new(own),
            selected,
            self.selector.clone(),
            self.prop_types(),
            self.config.clone(),
        ));
        shared.check_prop_types(&shared.props());

        let listener: Listener = {
            let shared = Arc::downgrade(&shared);
            Arc::new(move || {
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                if let Err(error) = shared.refresh() {
                    warn!(controller = %shared.name, %error, "Keeping previous props");
                }
            })
        };
        let subscription = store.subscribe(listener);

        let props = {
            let shared = shared.clone();
            PropsGetter::new(move || shared.props())
        };
        let methods = Arc::new_cyclic(|table: &Weak<MethodTable>| {
            let namespace = Namespace::new(table.clone());
            self.methods
                .iter()
                .map(|(name, def)| {
                    let method = self.engine.bind(name, def.clone(), props.clone(), namespace.clone());
                    (name.to_string(), method)
                })
                .collect::<MethodTable>()
        });

        debug!(
            controller = %shared.name,
            methods = methods.len(),
            fields = self.selector.len(),
            "Mounted controller"
        );

        let initialization = methods
            .get("initialize")
            .map(|initialize| initialize.spawn(Args::new()));

        Ok(ControllerInstance::new(
            self.root.clone(),
            shared,
            methods,
            subscription,
            initialization,
        ))
    }
}

impl<S: Store, V> fmt::Debug for Controller<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("methods", &self.methods)
            .field("selector", &self.selector)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
