//! Selector aggregation.
//!
//! A [`SelectorBundle`] names a set of pure functions over store state.
//! [`aggregate`] turns it into a single [`CompositeSelector`] whose output is
//! every selector's value keyed by name, together with the matching
//! [`PropTypes`] record. [`disaggregate`] goes the other way.
//!
//! Selectors are never cached and must not have side effects; controllers
//! recompute the composite on every store notification.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::errors::SelectorError;
use crate::prop_types::{PropType, PropTypes};
use crate::props::PropMap;

type SelectFn<St> = dyn Fn(&St) -> Result<Value, String> + Send + Sync;

const UNNAMED: &str = "<unnamed>";

/// Pure function from state to one JSON value, plus a descriptor of that value.
pub struct Selector<St> {
    label: Arc<str>,
    select: Arc<SelectFn<St>>,
    prop_type: PropType,
}

impl<St: 'static> Selector<St> {
    /// Selector from an infallible closure.
    ///
    /// The result is serialized to JSON on every call; a value that fails to
    /// serialize is reported as a selector failure.
    pub fn new<T, F>(prop_type: PropType, select: F) -> Self
    where
        T: Serialize,
        F: Fn(&St) -> T + Send + Sync + 'static,
    {
        Self::from_fn(prop_type, move |state: &St| {
            serde_json::to_value(select(state)).map_err(|e| e.to_string())
        })
    }

    /// Selector from a fallible closure.
    pub fn try_new<T, E, F>(prop_type: PropType, select: F) -> Self
    where
        T: Serialize,
        E: fmt::Display,
        F: Fn(&St) -> Result<T, E> + Send + Sync + 'static,
    {
        Self::from_fn(prop_type, move |state: &St| {
            let value = select(state).map_err(|e| e.to_string())?;
            serde_json::to_value(value).map_err(|e| e.to_string())
        })
    }

    fn from_fn(
        prop_type: PropType,
        select: impl Fn(&St) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: Arc::from(UNNAMED),
            select: Arc::new(select),
            prop_type,
        }
    }
}

impl<St> Selector<St> {
    /// Name used in error reports. Bundles set it to the entry's key.
    #[must_use]
    pub fn named(mut self, label: impl AsRef<str>) -> Self {
        self.label = Arc::from(label.as_ref());
        self
    }

    /// Evaluate against `state`.
    pub fn select(&self, state: &St) -> Result<Value, SelectorError> {
        (self.select)(state).map_err(|message| SelectorError::new(&*self.label, message))
    }

    /// Descriptor of the value this selector produces.
    pub fn prop_type(&self) -> &PropType {
        &self.prop_type
    }

    /// Name used in error reports.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<St> Clone for Selector<St> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            select: self.select.clone(),
            prop_type: self.prop_type.clone(),
        }
    }
}

impl<St> fmt::Debug for Selector<St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("label", &self.label)
            .field("prop_type", &self.prop_type)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Bundles
// ============================================================================

/// Ordered `name → Selector` mapping.
pub struct SelectorBundle<St> {
    selectors: IndexMap<String, Selector<St>>,
}

impl<St> SelectorBundle<St> {
    /// Empty bundle.
    pub fn new() -> Self {
        Self {
            selectors: IndexMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, selector: Selector<St>) -> Self {
        self.insert(name, selector);
        self
    }

    /// Insert or replace a selector, labelling it with `name`.
    pub fn insert(&mut self, name: impl Into<String>, selector: Selector<St>) {
        let name = name.into();
        let selector = selector.named(&name);
        self.selectors.insert(name, selector);
    }

    /// Look up a selector.
    pub fn get(&self, name: &str) -> Option<&Selector<St>> {
        self.selectors.get(name)
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.selectors.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selector<St>)> {
        self.selectors
            .iter()
            .map(|(name, selector)| (name.as_str(), selector))
    }

    /// Number of selectors.
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Whether the bundle is empty.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Merge `other` into this bundle. Entries from `other` win on a clash.
    pub fn merge(&mut self, other: SelectorBundle<St>) {
        for (name, selector) in other {
            self.insert(name, selector);
        }
    }
}

impl<St> Default for SelectorBundle<St> {
    fn default() -> Self {
        Self::new()
    }
}

impl<St> Clone for SelectorBundle<St> {
    fn clone(&self) -> Self {
        Self {
            selectors: self.selectors.clone(),
        }
    }
}

impl<St> fmt::Debug for SelectorBundle<St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.selectors.iter()).finish()
    }
}

impl<St, K: Into<String>> FromIterator<(K, Selector<St>)> for SelectorBundle<St> {
    fn from_iter<I: IntoIterator<Item = (K, Selector<St>)>>(iter: I) -> Self {
        let mut bundle = Self::new();
        for (name, selector) in iter {
            bundle.insert(name, selector);
        }
        bundle
    }
}

impl<St> IntoIterator for SelectorBundle<St> {
    type Item = (String, Selector<St>);
    type IntoIter = indexmap::map::IntoIter<String, Selector<St>>;

    fn into_iter(self) -> Self::IntoIter {
        self.selectors.into_iter()
    }
}

/// Merge bundles in iteration order; later bundles win on a name clash.
pub fn merge_bundles<St>(bundles: impl IntoIterator<Item = SelectorBundle<St>>) -> SelectorBundle<St> {
    let mut merged = SelectorBundle::new();
    for bundle in bundles {
        merged.merge(bundle);
    }
    merged
}

// ============================================================================
// Composite selector
// ============================================================================

/// Single function computing every selector in a bundle at once.
pub struct CompositeSelector<St> {
    selectors: Arc<IndexMap<String, Selector<St>>>,
    prop_types: Arc<PropTypes>,
}

impl<St> CompositeSelector<St> {
    /// Compute every selector against `state`.
    ///
    /// The first failing selector aborts the whole computation.
    pub fn select(&self, state: &St) -> Result<PropMap, SelectorError> {
        let mut values = PropMap::with_capacity(self.selectors.len());
        for (name, selector) in self.selectors.iter() {
            values.insert(name.clone(), selector.select(state)?);
        }
        Ok(values)
    }

    /// Descriptor record parallel to the output of [`select`](Self::select).
    pub fn prop_types(&self) -> &PropTypes {
        &self.prop_types
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.selectors.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Whether the composite has no fields.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl<St> Clone for CompositeSelector<St> {
    fn clone(&self) -> Self {
        Self {
            selectors: self.selectors.clone(),
            prop_types: self.prop_types.clone(),
        }
    }
}

impl<St> fmt::Debug for CompositeSelector<St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeSelector")
            .field("prop_types", &self.prop_types)
            .finish_non_exhaustive()
    }
}

/// Combine a bundle into one composite selector.
pub fn aggregate<St>(bundle: SelectorBundle<St>) -> CompositeSelector<St> {
    let prop_types = bundle
        .iter()
        .map(|(name, selector)| (name.to_string(), selector.prop_type().clone()))
        .collect();
    CompositeSelector {
        selectors: Arc::new(bundle.selectors),
        prop_types: Arc::new(prop_types),
    }
}

/// Split a composite back into one selector per field.
///
/// Each selector evaluates the original composite and projects its field, so
/// a failure anywhere in the composite fails every reconstructed selector.
pub fn disaggregate<St: 'static>(composite: &CompositeSelector<St>) -> SelectorBundle<St> {
    composite
        .prop_types()
        .iter()
        .map(|(name, prop_type)| {
            let field = name.to_string();
            let composite = composite.clone();
            let selector = Selector::from_fn(prop_type.clone(), move |state: &St| {
                match composite.select(state) {
                    Ok(mut values) => Ok(values.swap_remove(&field).unwrap_or(Value::Null)),
                    Err(e) if e.name() == field => Err(e.message().to_string()),
                    Err(e) => Err(e.to_string()),
                }
            });
            (name.to_string(), selector)
        })
        .collect()
}
