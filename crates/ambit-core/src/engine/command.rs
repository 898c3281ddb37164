//! Command protocol between controller methods and the interpreter.

use std::any::Any;
use std::fmt;

use futures::channel::oneshot;
use futures::future::BoxFuture;

use crate::errors::MethodError;
use crate::props::{Props, PropsGetter};
use crate::store::Store;

/// Type-erased outcome of an awaited future.
pub type Awaited = Result<Box<dyn Any + Send>, MethodError>;

/// Capability requested by a running controller method.
pub enum Command<S: Store> {
    /// Current props snapshot.
    GetProps,
    /// Getter that always returns the current props.
    GetPropsGetter,
    /// Dispatch an action to the store.
    Dispatch(S::Action),
    /// Suspend until the future resolves.
    Await(BoxFuture<'static, Awaited>),
}

impl<S: Store> Command<S> {
    /// Short name for logs and protocol errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetProps => "get_props",
            Self::GetPropsGetter => "get_props_getter",
            Self::Dispatch(_) => "dispatch",
            Self::Await(_) => "await",
        }
    }
}

impl<S: Store> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interpreter's answer to a [`Command`].
pub enum Resumption<S: Store> {
    /// Answer to [`Command::GetProps`].
    Props(Props<S>),
    /// Answer to [`Command::GetPropsGetter`].
    PropsGetter(PropsGetter<S>),
    /// Answer to [`Command::Dispatch`]: whatever the store returned.
    Dispatched(S::Dispatched),
    /// Answer to [`Command::Await`].
    Resolved(Awaited),
}

impl<S: Store> fmt::Debug for Resumption<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Props(props) => f.debug_tuple("Props").field(props).finish(),
            Self::PropsGetter(_) => f.write_str("PropsGetter"),
            Self::Dispatched(_) => f.write_str("Dispatched"),
            Self::Resolved(Ok(_)) => f.write_str("Resolved(Ok)"),
            Self::Resolved(Err(e)) => write!(f, "Resolved(Err({e}))"),
        }
    }
}

/// A command together with its reply slot.
pub(crate) struct Request<S: Store> {
    pub(crate) command: Command<S>,
    pub(crate) reply: oneshot::Sender<Resumption<S>>,
}
