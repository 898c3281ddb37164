//! Handle a controller method uses to talk to the engine.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::channel::{mpsc, oneshot};
use futures::FutureExt;

use super::command::{Command, Request, Resumption};
use super::method::Namespace;
use crate::errors::{MethodError, MethodResult};
use crate::props::{Args, Props, PropsGetter};
use crate::store::Store;

/// Sends commands to the interpreter driving one invocation.
///
/// Every operation sends a single [`Command`] and waits for its answer, so
/// commands of one invocation resolve in the order they were issued.
pub struct Yielder<S: Store> {
    method: Arc<str>,
    requests: mpsc::UnboundedSender<Request<S>>,
    namespace: Namespace,
}

impl<S: Store> Yielder<S> {
    pub(crate) fn new(
        method: Arc<str>,
        requests: mpsc::UnboundedSender<Request<S>>,
        namespace: Namespace,
    ) -> Self {
        Self {
            method,
            requests,
            namespace,
        }
    }

    async fn request(&self, command: Command<S>) -> Result<Resumption<S>, MethodError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .unbounded_send(Request { command, reply })
            .map_err(|_| self.abandoned())?;
        response.await.map_err(|_| self.abandoned())
    }

    fn abandoned(&self) -> MethodError {
        MethodError::Abandoned(self.method.to_string())
    }

    /// Props as they are right now.
    pub async fn props(&self) -> Result<Props<S>, MethodError> {
        match self.request(Command::GetProps).await? {
            Resumption::Props(props) => Ok(props),
            _ => Err(MethodError::Protocol {
                command: "get_props",
            }),
        }
    }

    /// Getter for fresh props after a suspension.
    pub async fn props_getter(&self) -> Result<PropsGetter<S>, MethodError> {
        match self.request(Command::GetPropsGetter).await? {
            Resumption::PropsGetter(getter) => Ok(getter),
            _ => Err(MethodError::Protocol {
                command: "get_props_getter",
            }),
        }
    }

    /// Dispatch an action and return what the store handed back.
    pub async fn dispatch(&self, action: S::Action) -> Result<S::Dispatched, MethodError> {
        match self.request(Command::Dispatch(action)).await? {
            Resumption::Dispatched(dispatched) => Ok(dispatched),
            _ => Err(MethodError::Protocol {
                command: "dispatch",
            }),
        }
    }

    /// Suspend on a fallible future.
    ///
    /// A failure is delivered back here as `Err`, so the method can recover
    /// with `match` or propagate it with `?`.
    pub async fn wait<T, E, F>(&self, future: F) -> Result<T, MethodError>
    where
        T: Send + 'static,
        E: Into<MethodError> + 'static,
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let erased = async move {
            future
                .await
                .map(|value| Box::new(value) as Box<dyn Any + Send>)
                .map_err(Into::into)
        }
        .boxed();

        match self.request(Command::Await(erased)).await? {
            Resumption::Resolved(Ok(value)) => value
                .downcast::<T>()
                .map(|value| *value)
                .map_err(|_| MethodError::Protocol { command: "await" }),
            Resumption::Resolved(Err(error)) => Err(error),
            _ => Err(MethodError::Protocol { command: "await" }),
        }
    }

    /// Suspend on a future that cannot fail.
    pub async fn value<T, F>(&self, future: F) -> Result<T, MethodError>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        self.wait(async move { Ok::<T, MethodError>(future.await) })
            .await
    }

    /// Invoke another method of the same controller and wait for its result.
    pub async fn call(&self, name: &str, args: Args) -> MethodResult {
        let method = self.namespace.get(name)?;
        self.wait(method.invoke(args)).await
    }

    /// Sibling methods, for starting invocations without waiting on them.
    pub fn methods(&self) -> &Namespace {
        &self.namespace
    }

    /// Name of the method this yielder belongs to.
    pub fn method_name(&self) -> &str {
        &self.method
    }
}

impl<S: Store> fmt::Debug for Yielder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Yielder")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
