/// Database models for TaskZen
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts reachable via password, Google, or GitHub identity
/// - `task`: Owner-scoped task records
///
/// # Example
///
/// ```no_run
/// use taskzen_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: "Ann".to_string(),
///         email: Some("ann@example.com".to_string()),
///         password_hash: Some("$argon2id$...".to_string()),
///         google_id: None,
///         github_id: None,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub mod task;
pub mod user;
