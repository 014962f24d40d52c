//! Task scopes: spawned work is tracked so it can be cancelled together, and
//! failures are logged instead of propagated.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::error::GardenError;

#[derive(Clone)]
pub struct AppScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    name: String,
    handle: Handle,
    tasks: Mutex<Vec<AbortHandle>>,
    children: Mutex<Vec<AppScope>>,
}

impl AppScope {
    /// A root scope on the current tokio runtime.
    pub fn current(name: impl Into<String>) -> Result<Self, GardenError> {
        let handle = Handle::try_current()
            .map_err(|e| GardenError::Runtime(format!("no tokio runtime: {e}")))?;
        Ok(Self::with_handle(name, handle))
    }

    pub fn with_handle(name: impl Into<String>, handle: Handle) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name: name.into(),
                handle,
                tasks: Mutex::new(Vec::new()),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// A scope cancelled together with this one.
    pub fn child(&self, name: impl Into<String>) -> AppScope {
        let child = Self::with_handle(
            format!("{}/{}", self.inner.name, name.into()),
            self.inner.handle.clone(),
        );
        self.inner
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child.clone());
        child
    }

    /// Spawn a task on this scope. A panic inside it is logged.
    pub fn spawn<F>(&self, future: F) -> AbortHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = self.inner.handle.spawn(future);
        let abort = task.abort_handle();
        self.track(abort.clone());

        let scope = self.inner.name.clone();
        self.inner.handle.spawn(async move {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!(%scope, "task panicked: {}", panic_message(&*e.into_panic()));
                }
            }
        });
        abort
    }

    /// Spawn a task whose error is logged rather than returned.
    pub fn spawn_fallible<F, E>(&self, future: F) -> AbortHandle
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let scope = self.inner.name.clone();
        self.spawn(async move {
            if let Err(e) = future.await {
                tracing::error!(%scope, "task failed: {e}");
            }
        })
    }

    /// Abort every task of this scope and its children.
    pub fn cancel(&self) {
        let tasks = std::mem::take(&mut *self.lock_tasks());
        for task in tasks {
            task.abort();
        }
        let children = self
            .inner
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for child in children {
            child.cancel();
        }
    }

    /// Number of tasks spawned on this scope that have not finished.
    pub fn active_tasks(&self) -> usize {
        let mut tasks = self.lock_tasks();
        tasks.retain(|t| !t.is_finished());
        tasks.len()
    }

    fn track(&self, abort: AbortHandle) {
        let mut tasks = self.lock_tasks();
        tasks.retain(|t| !t.is_finished());
        tasks.push(abort);
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<AbortHandle>> {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_current_requires_runtime() {
        assert!(AppScope::current("app").is_ok());
    }

    #[test]
    fn test_current_without_runtime() {
        assert!(matches!(
            AppScope::current("app"),
            Err(GardenError::Runtime(_))
        ));
    }

    #[tokio::test]
    async fn test_child_name() {
        let scope = AppScope::current("app").unwrap();
        assert_eq!(scope.child("fetcher").name(), "app/fetcher");
    }

    #[tokio::test]
    async fn test_cancel_aborts_children() {
        let scope = AppScope::current("app").unwrap();
        let child = scope.child("fetcher");
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        child.spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            let _ = tx.send(());
        });
        assert_eq!(child.active_tasks(), 1);

        scope.cancel();
        // The sender is dropped without sending once the task is aborted.
        assert!(rx.await.is_err());
        assert_eq!(child.active_tasks(), 0);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let scope = AppScope::current("app").unwrap();
        scope.spawn(async { panic!("boom") });
        let (tx, rx) = tokio::sync::oneshot::channel();
        scope.spawn(async move {
            let _ = tx.send(42);
        });
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_fallible_error_is_contained() {
        let scope = AppScope::current("app").unwrap();
        scope.spawn_fallible(async { Err::<(), _>("bad page") });
        let (tx, rx) = tokio::sync::oneshot::channel();
        scope.spawn_fallible(async move {
            let _ = tx.send(());
            Ok::<(), String>(())
        });
        assert!(rx.await.is_ok());
    }
}
