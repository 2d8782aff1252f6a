use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContextError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// Context-dependent code ran outside any request scope. This is a wiring
    /// bug, not a client error.
    #[error("RequestContext missing (request scope not initialized)")]
    Missing,

    #[error("{0} is required but not set in request context")]
    MissingRequiredField(&'static str),
}
