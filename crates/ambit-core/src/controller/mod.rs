//! Controller factory.
//!
//! A [`Controller`] binds a root [`View`](crate::View) to a set of selector
//! bundles and controller methods. Mounting it against a store yields a
//! [`ControllerInstance`] that keeps props current, owns the bound methods and
//! exposes both to the view tree through a [`Context`](crate::Context).

mod factory;
mod instance;
mod methods;

pub use factory::Controller;
pub use instance::ControllerInstance;
pub use methods::{ControllerMethods, MethodDef};
