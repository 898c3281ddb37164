//! Ambient context passed down the view tree.
//!
//! A [`Context`] is the union of a controller instance's selector output and
//! its bound methods. The root receives it from
//! [`ControllerInstance::render`](crate::ControllerInstance::render) and passes
//! it by reference to every child it renders, so any descendant can read any
//! field without intermediate views forwarding it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::engine::{BoundMethod, MethodTable};
use crate::errors::{ContractError, MethodError, ViewError};
use crate::prop_types::{PropTypes, Provided};
use crate::props::{decode, PropMap};
use crate::view::View;

/// One ambient field.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    /// Selector output.
    Value(&'a Value),
    /// Bound controller method.
    Method(&'a BoundMethod),
}

/// Selector values and bound methods of one controller instance.
#[derive(Debug, Clone)]
pub struct Context {
    values: Arc<PropMap>,
    methods: Arc<MethodTable>,
    revision: u64,
}

impl Context {
    pub(crate) fn new(values: Arc<PropMap>, methods: Arc<MethodTable>, revision: u64) -> Self {
        Self {
            values,
            methods,
            revision,
        }
    }

    /// Look up a field. A method shadows a selector value of the same name.
    pub fn get(&self, name: &str) -> Option<Entry<'_>> {
        match self.methods.get(name) {
            Some(method) => Some(Entry::Method(method)),
            None => self.values.get(name).map(Entry::Value),
        }
    }

    /// Selector value, unless a method of the same name shadows it.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name)? {
            Entry::Value(value) => Some(value),
            Entry::Method(_) => None,
        }
    }

    /// Decode a selector value; absent values decode as null.
    pub fn value_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, ViewError> {
        decode(self.value(name)).map_err(|message| ViewError::Decode {
            field: name.to_string(),
            message,
        })
    }

    /// Bound method by name.
    pub fn method(&self, name: &str) -> Result<&BoundMethod, ViewError> {
        self.methods
            .get(name)
            .ok_or_else(|| MethodError::UnknownMethod(name.to_string()).into())
    }

    /// Every field name: selector names followed by method names, without duplicates.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self
            .values
            .keys()
            .map(String::as_str)
            .filter(|name| !self.methods.contains(name))
            .collect();
        fields.extend(self.methods.names());
        fields
    }

    /// Whether the field exists.
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains(name) || self.values.contains_key(name)
    }

    /// Instance revision this context was taken at.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Check a component's ambient contract against this context.
    pub fn check(&self, component: &str, types: &PropTypes) -> Result<(), ContractError> {
        types.check(component, |field| {
            self.get(field).map(|entry| match entry {
                Entry::Value(value) => Provided::Value(value),
                Entry::Method(_) => Provided::Method,
            })
        })
    }

    /// Render `view` with `props`, after checking both of its contracts.
    pub fn render<V: View>(&self, view: &V, props: &PropMap) -> Result<V::Output, ViewError> {
        let name = view.name();
        self.check(name, &view.context_types())?;
        view.prop_types().check_props(name, props)?;
        view.render(props, self)
    }
}
