//! Controller-method execution engine.
//!
//! A controller method is an async body that never touches props or the store
//! directly. It sends [`Command`]s through its [`Yielder`], and the engine's
//! drive loop hands each command to an [`Interpreter`] and feeds the
//! [`Resumption`] back into the body:
//!
//! ```text
//! body ──Command──▶ drive loop ──execute──▶ Interpreter
//!   ▲                                          │
//!   └───────────────Resumption─────────────────┘
//! ```
//!
//! Every invocation gets its own command channel. Nothing orders or excludes
//! concurrent invocations of the same method; they interleave by the order in
//! which their awaited futures resolve.

mod command;
mod interpreter;
mod method;
mod yielder;

use std::fmt;
use std::sync::Arc;

use futures::channel::mpsc;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use tracing::Instrument;

pub use command::{Awaited, Command, Resumption};
pub use interpreter::{Interpreter, LiveInterpreter};
pub use method::{BoundMethod, Invocation, MethodTable, Namespace};
pub use yielder::Yielder;

use command::Request;

use crate::controller::MethodDef;
use crate::errors::MethodResult;
use crate::props::{Args, PropsGetter};
use crate::store::Store;

/// Binds method definitions to an interpreter.
pub struct Engine<S: Store> {
    interpreter: Arc<dyn Interpreter<S>>,
}

impl<S: Store> Engine<S> {
    /// Engine driven by `interpreter`.
    pub fn new(interpreter: impl Interpreter<S>) -> Self {
        Self {
            interpreter: Arc::new(interpreter),
        }
    }

    /// Turn a definition into a callable bound to `props` and `namespace`.
    pub fn bind(
        &self,
        name: &str,
        def: MethodDef<S>,
        props: PropsGetter<S>,
        namespace: Namespace,
    ) -> BoundMethod {
        let method: Arc<str> = Arc::from(name);
        let interpreter = self.interpreter.clone();

        BoundMethod::new(method.clone(), move |args: Args| {
            let (requests, commands) = mpsc::unbounded();
            let yielder = Yielder::new(method.clone(), requests, namespace.pinned());
            let body = def.call(yielder, args);
            let span = tracing::debug_span!("controller_method", method = %method);

            drive(interpreter.clone(), props.clone(), body, commands)
                .instrument(span)
                .boxed()
        })
    }
}

impl<S: Store> Default for Engine<S> {
    fn default() -> Self {
        Self::new(LiveInterpreter)
    }
}

impl<S: Store> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            interpreter: self.interpreter.clone(),
        }
    }
}

impl<S: Store> fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

/// Run `body` to completion, answering its commands in order.
///
/// The body is polled before the command stream so a finished body wins over
/// a command it queued and abandoned.
async fn drive<S: Store>(
    interpreter: Arc<dyn Interpreter<S>>,
    props: PropsGetter<S>,
    body: BoxFuture<'static, MethodResult>,
    mut commands: mpsc::UnboundedReceiver<Request<S>>,
) -> MethodResult {
    let mut body = body.fuse();

    loop {
        let request = futures::select_biased! {
            result = body => return result,
            request = commands.next() => request,
        };

        match request {
            Some(Request { command, reply }) => {
                let resumption = interpreter.execute(command, &props).await;
                // The body may have stopped listening; that is its own business.
                let _ = reply.send(resumption);
            }
            None => return body.await,
        }
    }
}
