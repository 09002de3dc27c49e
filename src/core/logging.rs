//! Logging utilities with request context support.
//!
//! The request id and the session id of the request being served live in
//! task-local storage so that log lines deep inside the relay can carry them
//! without threading them through every call.

tokio::task_local! {
    /// Task-local storage for the current request ID.
    ///
    /// Set by the request-id middleware for the duration of each request.
    pub static REQUEST_ID: String;
}

tokio::task_local! {
    /// Task-local storage for the session identifier of the chat being served.
    pub static SESSION_ID: String;
}

/// Get the current request ID from context, if set.
///
/// Returns an empty string if no request ID is set.
pub fn get_request_id() -> String {
    REQUEST_ID.try_with(|id| id.clone()).unwrap_or_default()
}

/// Get the current session ID from context, if set.
///
/// Returns an empty string if no session is in scope.
pub fn get_session_id() -> String {
    SESSION_ID.try_with(|id| id.clone()).unwrap_or_default()
}

/// Generate a new unique request ID using UUID v4.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
