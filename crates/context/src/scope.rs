//! Ambient request scope.
//!
//! The context is bound to the request's future tree with a Tokio task-local,
//! so it survives `.await` points and is restored whenever the request's
//! future is polled again, regardless of which worker thread polls it. Two
//! requests never share a binding: each scope owns its own record.
//!
//! Tasks started with [`tokio::spawn`] do not inherit task-locals; use
//! [`spawn`] to carry the current request's context into a child task.

use crate::error::{ContextError, Result};
use crate::RequestContext;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::Span;

tokio::task_local! {
    static CURRENT: ContextHandle;
}

/// Shared handle to one request's context record.
#[derive(Debug, Clone)]
pub struct ContextHandle {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    context: RwLock<RequestContext>,
    // Request span; tenant and user are recorded on it as they become known
    span: Span,
}

impl ContextHandle {
    pub fn new(context: RequestContext) -> Self {
        Self::with_span(context, Span::none())
    }

    /// Binds the record to a span declaring `tenant_id` and `user_id` fields.
    pub fn with_span(context: RequestContext, span: Span) -> Self {
        Self {
            shared: Arc::new(Shared {
                context: RwLock::new(context),
                span,
            }),
        }
    }

    pub fn snapshot(&self) -> RequestContext {
        self.read(RequestContext::clone)
    }

    pub fn request_id(&self) -> String {
        self.read(|ctx| ctx.request_id().to_string())
    }

    pub fn span(&self) -> &Span {
        &self.shared.span
    }

    pub fn set_tenant(&self, tenant_id: impl Into<String>) {
        let tenant_id = tenant_id.into();
        self.shared.span.record("tenant_id", tenant_id.as_str());
        self.write(|ctx| ctx.tenant_id = Some(tenant_id));
    }

    pub fn set_user(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.shared.span.record("user_id", user_id.as_str());
        self.write(|ctx| ctx.user_id = Some(user_id));
    }

    pub fn set_super_admin(&self, is_super_admin: bool) {
        self.write(|ctx| ctx.is_super_admin = is_super_admin);
    }

    fn read<R>(&self, f: impl FnOnce(&RequestContext) -> R) -> R {
        let guard = self
            .shared
            .context
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut RequestContext) -> R) -> R {
        let mut guard = self
            .shared
            .context
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

/// Runs `fut` with a fresh ambient context.
pub async fn scope<F>(context: RequestContext, fut: F) -> F::Output
where
    F: Future,
{
    scope_with(ContextHandle::new(context), fut).await
}

/// Runs `fut` with an existing handle as the ambient context.
pub async fn scope_with<F>(handle: ContextHandle, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(handle, fut).await
}

/// Synchronous variant of [`scope_with`].
pub fn scope_sync<R>(handle: ContextHandle, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(handle, f)
}

/// Handle of the active scope, if any.
pub fn handle() -> Option<ContextHandle> {
    CURRENT.try_with(ContextHandle::clone).ok()
}

fn with_handle<R>(f: impl FnOnce(&ContextHandle) -> R) -> Result<R> {
    CURRENT.try_with(f).map_err(|_| ContextError::Missing)
}

/// Snapshot of the active context, or `None` outside a request.
pub fn current() -> Option<RequestContext> {
    with_handle(ContextHandle::snapshot).ok()
}

pub fn current_or_fail() -> Result<RequestContext> {
    with_handle(ContextHandle::snapshot)
}

pub fn request_id() -> Option<String> {
    with_handle(ContextHandle::request_id).ok()
}

pub fn set_tenant(tenant_id: impl Into<String>) -> Result<()> {
    let tenant_id = tenant_id.into();
    with_handle(|handle| handle.set_tenant(tenant_id))
}

pub fn set_user(user_id: impl Into<String>) -> Result<()> {
    let user_id = user_id.into();
    with_handle(|handle| handle.set_user(user_id))
}

pub fn set_super_admin(is_super_admin: bool) -> Result<()> {
    with_handle(|handle| handle.set_super_admin(is_super_admin))
}

pub fn is_super_admin() -> Result<bool> {
    with_handle(|handle| handle.read(|ctx| ctx.is_super_admin))
}

pub fn require_tenant() -> Result<String> {
    with_handle(|handle| handle.read(|ctx| ctx.tenant_id.clone()))?
        .filter(|id| !id.is_empty())
        .ok_or(ContextError::MissingRequiredField("TenantId"))
}

pub fn require_user() -> Result<String> {
    with_handle(|handle| handle.read(|ctx| ctx.user_id.clone()))?
        .filter(|id| !id.is_empty())
        .ok_or(ContextError::MissingRequiredField("UserId"))
}

/// Spawns a task that runs inside the current request's context.
///
/// The child shares the parent's record, so mutations on either side are
/// visible to both. Outside a request this is plain [`tokio::spawn`].
pub fn spawn<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match handle() {
        Some(handle) => tokio::spawn(CURRENT.scope(handle, fut)),
        None => tokio::spawn(fut),
    }
}
