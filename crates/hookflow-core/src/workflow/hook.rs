//! External hook collaborator port.
//!
//! Hook steps delegate to a `HookExecutor` identified by `hookId`. The trait
//! uses RPITIT, so it cannot be a trait object directly; `BoxHookExecutor`
//! provides type erasure with the usual blanket-impl pattern:
//! 1. An object-safe `HookExecutorDyn` trait with boxed futures
//! 2. A blanket impl of `HookExecutorDyn` for all `T: HookExecutor`
//! 3. `BoxHookExecutor` wraps `Box<dyn HookExecutorDyn>` and delegates

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hookflow_types::workflow::EventKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input passed to a hook invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookRequest {
    pub event: EventKind,
    pub data: Value,
    pub project_path: Option<String>,
}

/// What a hook reports back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutcome {
    pub success: bool,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("hook '{0}' not found")]
    NotFound(String),

    #[error("hook execution failed: {0}")]
    Failed(String),
}

/// Runs externally defined hooks by id.
pub trait HookExecutor: Send + Sync {
    fn test_hook(
        &self,
        hook_id: &str,
        request: &HookRequest,
    ) -> impl Future<Output = Result<HookOutcome, HookError>> + Send;
}

impl<T: HookExecutor> HookExecutor for Arc<T> {
    fn test_hook(
        &self,
        hook_id: &str,
        request: &HookRequest,
    ) -> impl Future<Output = Result<HookOutcome, HookError>> + Send {
        (**self).test_hook(hook_id, request)
    }
}

/// Object-safe version of [`HookExecutor`] with boxed futures.
pub trait HookExecutorDyn: Send + Sync {
    fn test_hook_boxed<'a>(
        &'a self,
        hook_id: &'a str,
        request: &'a HookRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HookOutcome, HookError>> + Send + 'a>>;
}

impl<T: HookExecutor> HookExecutorDyn for T {
    fn test_hook_boxed<'a>(
        &'a self,
        hook_id: &'a str,
        request: &'a HookRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HookOutcome, HookError>> + Send + 'a>> {
        Box::pin(self.test_hook(hook_id, request))
    }
}

/// Type-erased hook executor, so the engine is not generic over it.
pub struct BoxHookExecutor {
    inner: Box<dyn HookExecutorDyn + Send + Sync>,
}

impl BoxHookExecutor {
    pub fn new<T: HookExecutor + 'static>(executor: T) -> Self {
        Self {
            inner: Box::new(executor),
        }
    }

    pub async fn test_hook(
        &self,
        hook_id: &str,
        request: &HookRequest,
    ) -> Result<HookOutcome, HookError> {
        self.inner.test_hook_boxed(hook_id, request).await
    }
}

impl std::fmt::Debug for BoxHookExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxHookExecutor").finish_non_exhaustive()
    }
}
