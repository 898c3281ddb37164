//! Controller-method definitions.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;

use crate::engine::Yielder;
use crate::errors::MethodResult;
use crate::props::Args;
use crate::store::Store;

type DefFn<S> = dyn Fn(Yielder<S>, Args) -> BoxFuture<'static, MethodResult> + Send + Sync;

/// Body of a controller method before it is bound to an instance.
pub struct MethodDef<S: Store>(Arc<DefFn<S>>);

impl<S: Store> MethodDef<S> {
    /// Wrap an async procedure.
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: Fn(Yielder<S>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MethodResult> + Send + 'static,
    {
        Self(Arc::new(move |yielder, args| body(yielder, args).boxed()))
    }

    pub(crate) fn call(&self, yielder: Yielder<S>, args: Args) -> BoxFuture<'static, MethodResult> {
        (self.0)(yielder, args)
    }
}

impl<S: Store> Clone for MethodDef<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Named set of method definitions passed to [`Controller::new`](crate::Controller::new).
///
/// `initialize` and `deinitialize` are lifecycle hooks: the first runs once
/// when an instance mounts, the second once when it unmounts.
pub struct ControllerMethods<S: Store> {
    defs: IndexMap<String, MethodDef<S>>,
}

impl<S: Store> ControllerMethods<S> {
    /// Empty set.
    pub fn new() -> Self {
        Self {
            defs: IndexMap::new(),
        }
    }

    /// Builder-style insert of an async procedure.
    #[must_use]
    pub fn with<F, Fut>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Yielder<S>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MethodResult> + Send + 'static,
    {
        self.insert(name, MethodDef::new(body));
        self
    }

    /// Insert or replace a definition.
    pub fn insert(&mut self, name: impl Into<String>, def: MethodDef<S>) {
        self.defs.insert(name.into(), def);
    }

    /// Look up a definition.
    pub fn get(&self, name: &str) -> Option<&MethodDef<S>> {
        self.defs.get(name)
    }

    /// Names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &MethodDef<S>)> {
        self.defs.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether no methods are defined.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl<S: Store> Default for ControllerMethods<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> Clone for ControllerMethods<S> {
    fn clone(&self) -> Self {
        Self {
            defs: self.defs.clone(),
        }
    }
}

impl<S: Store> fmt::Debug for ControllerMethods<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.defs.keys()).finish()
    }
}
