/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, and current-user endpoints
/// - `oauth`: Google and GitHub login flows
/// - `tasks`: Owner-scoped task endpoints

pub mod auth;
pub mod health;
pub mod oauth;
pub mod tasks;
