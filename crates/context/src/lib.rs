// Request context propagation
// Per-request correlation record reachable from any code running inside a request

pub mod context;
pub mod error;
pub mod request_id;
pub mod scope;

pub use context::RequestContext;
pub use error::{ContextError, Result};
pub use request_id::{generate_request_id, resolve_request_id, REQUEST_ID_HEADER};
pub use scope::{
    current, current_or_fail, handle, is_super_admin, request_id, require_tenant, require_user,
    scope, scope_sync, scope_with, set_super_admin, set_tenant, set_user, spawn, ContextHandle,
};
