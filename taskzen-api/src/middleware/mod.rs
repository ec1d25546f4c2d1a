/// Middleware modules for the API server
///
/// - `auth`: bearer-token gate that resolves the current user

pub mod auth;
