//! # Ambit Core
//!
//! Controller layer between a view tree and an application store.
//!
//! Views stay free of data fetching and dispatch. A [`Controller`] wraps the
//! root view with:
//!
//! - **Selectors**: pure functions over store state, aggregated into one
//!   [`CompositeSelector`] whose output becomes the instance's props
//! - **Controller methods**: async procedures that read live props, dispatch
//!   actions, await results and call each other, all through [`Command`]s
//!   run by an [`Interpreter`]
//! - **Ambient context**: selector output and bound methods handed to every
//!   descendant view through a [`Context`], with no per-level forwarding
//!
//! ## Example
//!
//! ```rust,ignore
//! let controller = Controller::new(
//!     Layout,
//!     ControllerMethods::new()
//!         .with("initialize", |y: Yielder<AppStore>, _| async move {
//!             let reddit: String = y.props().await?.get_as("selectedReddit")?;
//!             y.call("fetchPostsIfNeeded", args![reddit]).await
//!         }),
//!     [selectors()],
//! );
//!
//! let instance = controller.mount(store, PropMap::new())?;
//! let output = instance.render()?;
//! ```
//!
//! Mounting must happen inside a Tokio runtime: invocations that suspend on
//! a pending future continue as tasks on it.

#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod controller;
pub mod engine;
pub mod errors;
pub mod prop_types;
pub mod props;
pub mod selector;
pub mod store;
pub mod view;

pub use config::ControllerConfig;
pub use context::{Context, Entry};
pub use controller::{Controller, ControllerInstance, ControllerMethods, MethodDef};
pub use engine::{
    Awaited, BoundMethod, Command, Engine, Interpreter, Invocation, LiveInterpreter, MethodTable,
    Namespace, Resumption, Yielder,
};
pub use errors::{
    ContractError, ControllerError, MethodError, MethodResult, SelectorError, ViewError,
};
pub use prop_types::{PropKind, PropType, PropTypes, Provided};
pub use props::{Args, PropMap, Props, PropsGetter};
pub use selector::{
    aggregate, disaggregate, merge_bundles, CompositeSelector, Selector, SelectorBundle,
};
pub use store::{Listener, Store, Subscription};
pub use view::View;

// Re-exported for `args!` and for building JSON props.
pub use serde_json::{json, Value};
