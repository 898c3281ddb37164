//! Rendering collaborator.
//!
//! Ambit does not render anything itself. A [`View`] declares what it reads
//! from its own props and from the ambient [`Context`], and produces whatever
//! output the host rendering layer wants.

use crate::context::Context;
use crate::errors::ViewError;
use crate::prop_types::PropTypes;
use crate::props::PropMap;

/// A component in the view tree.
///
/// Views render children through [`Context::render`], which checks the
/// child's declared contracts and hands it the same context.
pub trait View: Send + Sync + 'static {
    /// Rendered representation.
    type Output;

    /// Component name used in contract errors and logs.
    fn name(&self) -> &str {
        let path = std::any::type_name::<Self>();
        path.rsplit("::").next().unwrap_or(path)
    }

    /// Contract for props passed directly by the parent.
    fn prop_types(&self) -> PropTypes {
        PropTypes::new()
    }

    /// Contract for ambient fields read from the context.
    fn context_types(&self) -> PropTypes {
        PropTypes::new()
    }

    /// Produce output from own props and the ambient context.
    fn render(&self, props: &PropMap, cx: &Context) -> Result<Self::Output, ViewError>;
}
