//! Bound methods, invocation handles and the per-instance method namespace.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::errors::{MethodError, MethodResult};
use crate::props::Args;

type CallFn = dyn Fn(Args) -> BoxFuture<'static, MethodResult> + Send + Sync;

/// Controller method bound to one instance's props and namespace.
///
/// Clones share identity; see [`BoundMethod::ptr_eq`].
#[derive(Clone)]
pub struct BoundMethod {
    name: Arc<str>,
    call: Arc<CallFn>,
}

impl BoundMethod {
    pub(crate) fn new(
        name: Arc<str>,
        call: impl Fn(Args) -> BoxFuture<'static, MethodResult> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            call: Arc::new(call),
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start an invocation lazily. Nothing runs until the future is polled.
    pub fn invoke(&self, args: Args) -> BoxFuture<'static, MethodResult> {
        (self.call)(args)
    }

    /// Start an invocation now.
    ///
    /// The method runs synchronously until it first suspends on a pending
    /// future, so props reads and dispatches before that point have already
    /// happened when this returns. The remainder continues on the current
    /// Tokio runtime. Rejections are logged; await the returned
    /// [`Invocation`] to observe them.
    pub fn spawn(&self, args: Args) -> Invocation {
        let mut future = self.invoke(args);

        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        if let Poll::Ready(result) = future.as_mut().poll(&mut cx) {
            if let Err(error) = &result {
                warn!(method = %self.name, %error, "Controller method rejected");
            }
            return Invocation::finished(self.name.clone(), result);
        }

        match Handle::try_current() {
            Ok(handle) => {
                let name = self.name.clone();
                let task = handle.spawn(async move {
                    let result = future.await;
                    if let Err(error) = &result {
                        warn!(method = %name, %error, "Controller method rejected");
                    }
                    result
                });
                Invocation::running(self.name.clone(), task)
            }
            Err(_) => {
                let error = MethodError::NoRuntime(self.name.to_string());
                warn!(method = %self.name, %error, "Controller method dropped");
                Invocation::finished(self.name.clone(), Err(error))
            }
        }
    }

    /// Whether both handles refer to the same bound method.
    pub fn ptr_eq(&self, other: &BoundMethod) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundMethod").field(&self.name).finish()
    }
}

// ============================================================================
// Invocation handle
// ============================================================================

/// Handle to a started invocation. Resolves with the method's result.
///
/// Dropping the handle detaches the invocation; it keeps running.
pub struct Invocation {
    method: Arc<str>,
    state: InvocationState,
}

enum InvocationState {
    Finished(Option<MethodResult>),
    Running(JoinHandle<MethodResult>),
}

impl Invocation {
    fn finished(method: Arc<str>, result: MethodResult) -> Self {
        Self {
            method,
            state: InvocationState::Finished(Some(result)),
        }
    }

    fn running(method: Arc<str>, task: JoinHandle<MethodResult>) -> Self {
        Self {
            method,
            state: InvocationState::Running(task),
        }
    }

    /// Invocation that already failed.
    pub fn rejected(method: &str, error: MethodError) -> Self {
        Self::finished(Arc::from(method), Err(error))
    }

    /// Name of the invoked method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Whether the result is available without waiting.
    pub fn is_finished(&self) -> bool {
        match &self.state {
            InvocationState::Finished(_) => true,
            InvocationState::Running(task) => task.is_finished(),
        }
    }
}

impl Future for Invocation {
    type Output = MethodResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            InvocationState::Finished(result) => Poll::Ready(
                result
                    .take()
                    .unwrap_or_else(|| Err(MethodError::Abandoned(this.method.to_string()))),
            ),
            InvocationState::Running(task) => Pin::new(task).poll(cx).map(|joined| {
                joined.unwrap_or_else(|_| Err(MethodError::Abandoned(this.method.to_string())))
            }),
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.method)
            .field("finished", &self.is_finished())
            .finish()
    }
}

// ============================================================================
// Method table and namespace
// ============================================================================

/// Fixed set of bound methods belonging to one controller instance.
#[derive(Debug, Default)]
pub struct MethodTable {
    methods: IndexMap<String, BoundMethod>,
}

impl MethodTable {
    /// Look up a method.
    pub fn get(&self, name: &str) -> Option<&BoundMethod> {
        self.methods.get(name)
    }

    /// Whether a method with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Method names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Methods in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundMethod)> {
        self.methods.iter().map(|(name, method)| (name.as_str(), method))
    }

    /// Number of methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl FromIterator<(String, BoundMethod)> for MethodTable {
    fn from_iter<I: IntoIterator<Item = (String, BoundMethod)>>(iter: I) -> Self {
        Self {
            methods: iter.into_iter().collect(),
        }
    }
}

/// Handle to an instance's [`MethodTable`], used for delegation.
///
/// The handle stored inside bound methods is weak, so the table and the
/// methods do not keep each other alive. Each invocation pins the table when
/// it starts and holds it until it completes; delegation from an invocation
/// that outlives its instance still resolves.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    table: Weak<MethodTable>,
    pinned: Option<Arc<MethodTable>>,
}

impl Namespace {
    pub(crate) fn new(table: Weak<MethodTable>) -> Self {
        Self {
            table,
            pinned: None,
        }
    }

    /// Same namespace, holding the table for as long as the copy lives.
    pub(crate) fn pinned(&self) -> Self {
        Self {
            table: self.table.clone(),
            pinned: self.pinned.clone().or_else(|| self.table.upgrade()),
        }
    }

    /// Whether the table is held by this handle.
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// Resolve a sibling method.
    ///
    /// Fails with [`MethodError::Unmounted`] only for handles that were never
    /// pinned and whose instance is gone.
    pub fn get(&self, name: &str) -> Result<BoundMethod, MethodError> {
        let table = match &self.pinned {
            Some(table) => table.clone(),
            None => self
                .table
                .upgrade()
                .ok_or_else(|| MethodError::Unmounted(name.to_string()))?,
        };
        table
            .get(name)
            .cloned()
            .ok_or_else(|| MethodError::UnknownMethod(name.to_string()))
    }

    /// Start a sibling method without waiting for it.
    pub fn spawn(&self, name: &str, args: Args) -> Invocation {
        match self.get(name) {
            Ok(method) => method.spawn(args),
            Err(error) => Invocation::rejected(name, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_namespace_keeps_the_table_alive() {
        let table = Arc::new(MethodTable::default());
        let namespace = Namespace::new(Arc::downgrade(&table));
        let pinned = namespace.pinned();
        drop(table);

        assert!(pinned.is_pinned());
        assert!(matches!(pinned.get("sibling"), Err(MethodError::UnknownMethod(_))));
        assert!(matches!(namespace.get("sibling"), Err(MethodError::Unmounted(_))));
        assert!(!namespace.pinned().is_pinned());
    }
}
