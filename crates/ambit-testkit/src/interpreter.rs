//! Interpreter that records the commands it executes.

use std::sync::Arc;

use ambit_core::{Command, Interpreter, LiveInterpreter, PropsGetter, Resumption, Store};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Delegates to [`LiveInterpreter`] and logs each command name.
///
/// Clones share one log, so keep a clone to inspect after handing the
/// interpreter to an engine.
#[derive(Debug, Clone, Default)]
pub struct RecordingInterpreter {
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingInterpreter {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Command names executed so far, in order.
    pub fn commands(&self) -> Vec<&'static str> {
        self.log.lock().clone()
    }

    /// Forget the recorded commands.
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

#[async_trait]
impl<S: Store> Interpreter<S> for RecordingInterpreter {
    async fn execute(&self, command: Command<S>, props: &PropsGetter<S>) -> Resumption<S> {
        self.log.lock().push(command.name());
        LiveInterpreter.execute(command, props).await
    }
}
