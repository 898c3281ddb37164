//! Property snapshots and invocation arguments.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::MethodError;
use crate::store::Store;

/// Ordered mapping of property names to values.
pub type PropMap = IndexMap<String, Value>;

/// Decode `value` (or null when absent) into `T`.
pub(crate) fn decode<T: DeserializeOwned>(value: Option<&Value>) -> Result<T, String> {
    match value {
        Some(value) => T::deserialize(value).map_err(|e| e.to_string()),
        None => T::deserialize(&Value::Null).map_err(|_| "is not provided".to_string()),
    }
}

/// Live property snapshot of a controller instance.
///
/// Combines the root's own props, the selector output and the store that
/// supplies `dispatch`. Selector values shadow own props of the same name.
pub struct Props<S: Store> {
    own: Arc<PropMap>,
    selected: Arc<PropMap>,
    store: Arc<S>,
}

impl<S: Store> Props<S> {
    /// Assemble a snapshot.
    pub fn new(own: Arc<PropMap>, selected: Arc<PropMap>, store: Arc<S>) -> Self {
        Self {
            own,
            selected,
            store,
        }
    }

    /// Look up a property, preferring selector output over own props.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.selected.get(name).or_else(|| self.own.get(name))
    }

    /// Decode a property into `T`.
    ///
    /// Absent properties decode as null, so `Option<T>` reads optional ones.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, MethodError> {
        decode(self.get(name)).map_err(|message| MethodError::Prop {
            name: name.to_string(),
            message,
        })
    }

    /// Selector output of this snapshot.
    pub fn selected(&self) -> &PropMap {
        &self.selected
    }

    /// Props the root was mounted with.
    pub fn own(&self) -> &PropMap {
        &self.own
    }

    pub(crate) fn selected_arc(&self) -> &Arc<PropMap> {
        &self.selected
    }

    /// Dispatch through the store backing this snapshot.
    pub fn dispatch(&self, action: S::Action) -> S::Dispatched {
        self.store.dispatch(action)
    }

    /// Store backing this snapshot.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: Store> Clone for Props<S> {
    fn clone(&self) -> Self {
        Self {
            own: self.own.clone(),
            selected: self.selected.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S: Store> fmt::Debug for Props<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("own", &self.own)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

/// Closure returning the instance's current props every time it is called.
///
/// Continuations that resume after a suspension use this to see fresh
/// props instead of whatever was current when they started.
pub struct PropsGetter<S: Store> {
    source: Arc<dyn Fn() -> Props<S> + Send + Sync>,
}

impl<S: Store> PropsGetter<S> {
    /// Wrap a props source.
    pub fn new(source: impl Fn() -> Props<S> + Send + Sync + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Current props.
    pub fn get(&self) -> Props<S> {
        (self.source)()
    }
}

impl<S: Store> Clone for PropsGetter<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<S: Store> fmt::Debug for PropsGetter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropsGetter").finish_non_exhaustive()
    }
}

/// Positional arguments of a controller-method invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Vec<Value>);

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style push.
    #[must_use]
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.0.push(value.into());
        self
    }

    /// Decode argument `index` into `T`; missing arguments decode as null.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, MethodError> {
        decode(self.0.get(index)).map_err(|message| MethodError::Argument { index, message })
    }

    /// Raw argument values.
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build [`Args`] from JSON-like expressions.
///
/// ```rust,ignore
/// let args = args!["reactjs", { "force": true }];
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:tt),+ $(,)?) => {
        $crate::Args::from(vec![$($crate::json!($value)),+])
    };
}
