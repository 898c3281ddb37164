//! Shape descriptors for selector outputs, own props and ambient fields.
//!
//! Every selector carries a [`PropType`] describing its result. Aggregating a
//! bundle yields a [`PropTypes`] record that doubles as the ambient contract a
//! controller advertises, and views declare the same kind of record for the
//! fields they read.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ContractError;
use crate::props::PropMap;

/// Kind of value a field holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    /// Anything, including null.
    Any,
    /// `true` or `false`.
    Bool,
    /// Any JSON number.
    Number,
    /// A string.
    String,
    /// An array, optionally with a declared element kind.
    Array(Option<Box<PropKind>>),
    /// A JSON object.
    Object,
    /// A callable; only controller methods satisfy it.
    Func,
}

impl PropKind {
    /// Human readable name used in contract errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Number => "number".to_string(),
            Self::String => "string".to_string(),
            Self::Array(None) => "array".to_string(),
            Self::Array(Some(element)) => format!("array of {}", element.describe()),
            Self::Object => "object".to_string(),
            Self::Func => "function".to_string(),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Array(None), Value::Array(_)) => true,
            (Self::Array(Some(element)), Value::Array(items)) => {
                items.iter().all(|item| element.accepts(item))
            }
            (Self::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

/// Name of a JSON value's shape, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declared shape of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropType {
    kind: PropKind,
    #[serde(default)]
    required: bool,
}

impl PropType {
    /// Optional field of the given kind.
    pub fn new(kind: PropKind) -> Self {
        Self {
            kind,
            required: false,
        }
    }

    /// Optional field of any shape.
    pub fn any() -> Self {
        Self::new(PropKind::Any)
    }

    /// Optional boolean field.
    pub fn bool() -> Self {
        Self::new(PropKind::Bool)
    }

    /// Optional numeric field.
    pub fn number() -> Self {
        Self::new(PropKind::Number)
    }

    /// Optional string field.
    pub fn string() -> Self {
        Self::new(PropKind::String)
    }

    /// Optional array field.
    pub fn array() -> Self {
        Self::new(PropKind::Array(None))
    }

    /// Optional array field whose elements all have `element` kind.
    pub fn array_of(element: PropKind) -> Self {
        Self::new(PropKind::Array(Some(Box::new(element))))
    }

    /// Optional object field.
    pub fn object() -> Self {
        Self::new(PropKind::Object)
    }

    /// Optional callable field.
    pub fn func() -> Self {
        Self::new(PropKind::Func)
    }

    /// Mark the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Declared kind.
    pub fn kind(&self) -> &PropKind {
        &self.kind
    }

    /// Whether the field must be present and non-null.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Check what a component was given for `field` against this type.
    pub fn check(
        &self,
        component: &str,
        field: &str,
        provided: Option<Provided<'_>>,
    ) -> Result<(), ContractError> {
        let missing = || ContractError::Missing {
            component: component.to_string(),
            field: field.to_string(),
        };
        let mismatch = |found: &str| ContractError::Mismatch {
            component: component.to_string(),
            field: field.to_string(),
            expected: self.kind.describe(),
            found: found.to_string(),
        };

        match provided {
            None | Some(Provided::Value(Value::Null)) if self.required => Err(missing()),
            None | Some(Provided::Value(Value::Null)) => Ok(()),
            Some(Provided::Method) => match self.kind {
                PropKind::Func | PropKind::Any => Ok(()),
                _ => Err(mismatch("function")),
            },
            Some(Provided::Value(value)) => {
                if self.kind.accepts(value) {
                    Ok(())
                } else {
                    Err(mismatch(value_kind(value)))
                }
            }
        }
    }
}

/// What a lookup found for a declared field.
#[derive(Debug, Clone, Copy)]
pub enum Provided<'a> {
    /// A plain value.
    Value(&'a Value),
    /// A controller method.
    Method,
}

/// Ordered `name → PropType` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropTypes(IndexMap<String, PropType>);

impl PropTypes {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, prop_type: PropType) -> Self {
        self.0.insert(name.into(), prop_type);
        self
    }

    /// Insert or replace one entry.
    pub fn insert(&mut self, name: impl Into<String>, prop_type: PropType) -> Option<PropType> {
        self.0.insert(name.into(), prop_type)
    }

    /// Merge another record into this one; later entries win.
    pub fn extend(&mut self, other: &PropTypes) {
        for (name, prop_type) in other.iter() {
            self.0.insert(name.to_string(), prop_type.clone());
        }
    }

    /// Look up one entry.
    pub fn get(&self, name: &str) -> Option<&PropType> {
        self.0.get(name)
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Declared names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropType)> {
        self.0.iter().map(|(name, prop_type)| (name.as_str(), prop_type))
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check every declared field against `lookup`, stopping at the first failure.
    pub fn check<'a, F>(&self, component: &str, lookup: F) -> Result<(), ContractError>
    where
        F: Fn(&str) -> Option<Provided<'a>>,
    {
        for (field, prop_type) in self.iter() {
            prop_type.check(component, field, lookup(field))?;
        }
        Ok(())
    }

    /// Check a plain property map.
    pub fn check_props(&self, component: &str, props: &PropMap) -> Result<(), ContractError> {
        self.check(component, |field| props.get(field).map(Provided::Value))
    }
}

impl FromIterator<(String, PropType)> for PropTypes {
    fn from_iter<I: IntoIterator<Item = (String, PropType)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
