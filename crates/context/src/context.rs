// Request context record

use serde::Serialize;

/// Correlation record for one in-flight request.
///
/// The request id is fixed at construction; tenant and user are filled in
/// later by tenant resolution and authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    request_id: String,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub is_super_admin: bool,
    method: Option<String>,
    path: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            tenant_id: None,
            user_id: None,
            is_super_admin: false,
            method: None,
            path: None,
        }
    }

    /// Records where the request came in (HTTP method and path with query).
    pub fn with_origin(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.path = Some(path.into());
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_has_no_identity() {
        let ctx = RequestContext::new("req-1");
        assert_eq!(ctx.request_id(), "req-1");
        assert!(ctx.tenant_id().is_none());
        assert!(ctx.user_id().is_none());
        assert!(!ctx.is_super_admin);
        assert!(ctx.method().is_none());
    }

    #[test]
    fn test_with_origin() {
        let ctx = RequestContext::new("req-1").with_origin("GET", "/api/v1/health?x=1");
        assert_eq!(ctx.method(), Some("GET"));
        assert_eq!(ctx.path(), Some("/api/v1/health?x=1"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut ctx = RequestContext::new("req-1");
        ctx.tenant_id = Some("tenant_a".to_string());

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["requestId"], "req-1");
        assert_eq!(json["tenantId"], "tenant_a");
        assert_eq!(json["userId"], serde_json::Value::Null);
        assert_eq!(json["isSuperAdmin"], false);
    }
}
