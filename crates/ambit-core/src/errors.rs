//! Error types for selectors, controller methods, views and mounting.
//!
//! Failures are split by where they surface:
//! - [`SelectorError`] aborts a whole composite selection cycle
//! - [`MethodError`] rejects a single controller-method invocation
//! - [`ContractError`] reports a view asking for a field nobody provides
//! - [`ViewError`] wraps everything a render can fail with
//! - [`ControllerError`] is returned by [`Controller::mount`](crate::Controller::mount)

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Result of a controller-method invocation.
pub type MethodResult = Result<serde_json::Value, MethodError>;

// ============================================================================
// Selector errors
// ============================================================================

/// A selector failed while mapping state to its value.
///
/// One failing selector aborts the entire composite computation for that
/// cycle; failures are not isolated per field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("selector `{name}` failed: {message}")]
pub struct SelectorError {
    name: String,
    message: String,
}

impl SelectorError {
    /// Create a selector error for the named field.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Name of the failing selector.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Failure description without the selector name.
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// Method errors
// ============================================================================

/// Failure of a controller-method invocation.
///
/// `Clone` so a single failure can be observed by every awaiter of a
/// delegated invocation; foreign errors are shared behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum MethodError {
    /// Delegation named a method the controller does not define.
    #[error("no controller method named `{0}`")]
    UnknownMethod(String),

    /// A method was started after its instance and every invocation of it were gone.
    #[error("controller was unmounted before `{0}` could be reached")]
    Unmounted(String),

    /// An invocation argument could not be decoded.
    #[error("argument {index}: {message}")]
    Argument {
        /// Position of the argument.
        index: usize,
        /// Decoding failure.
        message: String,
    },

    /// A property was missing or had an unexpected shape.
    #[error("property `{name}`: {message}")]
    Prop {
        /// Property name.
        name: String,
        /// Decoding failure.
        message: String,
    },

    /// The interpreter answered a command with the wrong kind of resumption.
    #[error("interpreter answered `{command}` with an unexpected resumption")]
    Protocol {
        /// Command that was answered incorrectly.
        command: &'static str,
    },

    /// The invocation stopped before producing a result.
    #[error("invocation of `{0}` was abandoned before it completed")]
    Abandoned(String),

    /// The method suspended but no Tokio runtime was available to continue it.
    #[error("`{0}` suspended outside of a Tokio runtime")]
    NoRuntime(String),

    /// A foreign failure raised by an awaited value or the method body.
    #[error("{0}")]
    Failed(Arc<dyn StdError + Send + Sync>),

    /// A plain failure message.
    #[error("{0}")]
    Message(String),
}

impl MethodError {
    /// Wrap a foreign error.
    pub fn failed(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Failed(Arc::new(error))
    }

    /// Build a failure from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Whether two errors are the same failure.
    ///
    /// Wrapped foreign errors compare by identity, everything else by value.
    pub fn is_same(&self, other: &MethodError) -> bool {
        match (self, other) {
            (Self::Failed(a), Self::Failed(b)) => Arc::ptr_eq(a, b),
            (Self::Failed(_), _) | (_, Self::Failed(_)) => false,
            (a, b) => a.to_string() == b.to_string(),
        }
    }
}

impl From<serde_json::Error> for MethodError {
    fn from(error: serde_json::Error) -> Self {
        Self::failed(error)
    }
}

impl From<std::io::Error> for MethodError {
    fn from(error: std::io::Error) -> Self {
        Self::failed(error)
    }
}

// ============================================================================
// Contract errors
// ============================================================================

/// A component declared a field that is missing or has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// A required field is not provided.
    #[error("`{component}` requires `{field}`, which is not provided")]
    Missing {
        /// Declaring component.
        component: String,
        /// Declared field.
        field: String,
    },

    /// A field is provided with a different shape than declared.
    #[error("`{component}` expects `{field}` to be {expected}, found {found}")]
    Mismatch {
        /// Declaring component.
        component: String,
        /// Declared field.
        field: String,
        /// Declared shape.
        expected: String,
        /// Provided shape.
        found: String,
    },
}

// ============================================================================
// View and controller errors
// ============================================================================

/// Failure while rendering a view.
#[derive(Debug, Clone, Error)]
pub enum ViewError {
    /// The view's declared contract is not satisfied.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// A controller method could not be reached.
    #[error(transparent)]
    Method(#[from] MethodError),

    /// A context value could not be decoded into the requested type.
    #[error("context field `{field}`: {message}")]
    Decode {
        /// Context field.
        field: String,
        /// Decoding failure.
        message: String,
    },

    /// View-specific failure.
    #[error("{0}")]
    Render(String),
}

/// Failure while mounting a controller.
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    /// The initial selection failed.
    #[error("initial selection failed: {0}")]
    Selector(#[from] SelectorError),

    /// `mount` was called outside of a Tokio runtime.
    #[error("controllers must be mounted inside a Tokio runtime")]
    NoRuntime,
}
