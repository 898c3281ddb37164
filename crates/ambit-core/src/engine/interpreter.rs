//! Interpreters execute the commands controller methods send.
//!
//! [`LiveInterpreter`] answers against the instance's live props and store.
//! Tests substitute their own interpreter to observe or script commands.

use async_trait::async_trait;
use tracing::trace;

use super::command::{Command, Resumption};
use crate::props::PropsGetter;
use crate::store::Store;

/// Executes one command on behalf of a running controller method.
///
/// Answering a command with a resumption of a different kind rejects the
/// invocation with [`MethodError::Protocol`](crate::MethodError::Protocol).
#[async_trait]
pub trait Interpreter<S: Store>: Send + Sync + 'static {
    /// Execute `command` for the invocation whose props are read through `props`.
    async fn execute(&self, command: Command<S>, props: &PropsGetter<S>) -> Resumption<S>;
}

/// Default interpreter backed by the instance's live props.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveInterpreter;

#[async_trait]
impl<S: Store> Interpreter<S> for LiveInterpreter {
    async fn execute(&self, command: Command<S>, props: &PropsGetter<S>) -> Resumption<S> {
        trace!(command = command.name(), "Interpreting command");

        match command {
            Command::GetProps => Resumption::Props(props.get()),
            Command::GetPropsGetter => Resumption::PropsGetter(props.clone()),
            Command::Dispatch(action) => Resumption::Dispatched(props.get().dispatch(action)),
            Command::Await(future) => Resumption::Resolved(future.await),
        }
    }
}
