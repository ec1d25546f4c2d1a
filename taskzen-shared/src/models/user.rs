/// User model and database operations
///
/// A user is reachable through up to three identity keys: a password hash,
/// a Google account id, and a GitHub account id. At least one must be set,
/// and each of `email`, `google_id`, and `github_id` is unique across the
/// table when present. Both rules are enforced by the schema itself
/// (CHECK constraint plus partial unique indexes), so no code path can
/// create an orphaned or duplicated identity.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255),
///     password_hash VARCHAR(255),
///     google_id VARCHAR(255),
///     github_id VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ,
///     CHECK (password_hash IS NOT NULL OR google_id IS NOT NULL OR github_id IS NOT NULL)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The hash is
/// nullable: OAuth-only accounts have no password at all.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name, required
    pub name: String,

    /// Email address, unique when present
    ///
    /// GitHub may withhold the address; in that case it stays NULL rather
    /// than being guessed.
    pub email: Option<String>,

    /// Argon2id password hash; present iff the user registered with a password
    pub password_hash: Option<String>,

    /// Google account id, unique when present
    pub google_id: Option<String>,

    /// GitHub account id, unique when present
    pub github_id: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Public view of a user, safe to return to clients
///
/// Deliberately omits `password_hash` and the raw provider ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, if known
    pub email: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Input for creating a new user
///
/// At least one of `password_hash`, `google_id`, `github_id` must be set;
/// the schema CHECK constraint rejects the insert otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address (None when the identity provider withholds it)
    pub email: Option<String>,

    /// Argon2id password hash (NOT a plaintext password!)
    pub password_hash: Option<String>,

    /// Google account id
    pub google_id: Option<String>,

    /// GitHub account id
    pub github_id: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if a unique identity field (`email`, `google_id`,
    /// `github_id`) collides with an existing row, if the CHECK constraint
    /// rejects an identity-less user, or if the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, google_id, github_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, google_id, github_id,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.google_id)
        .bind(data.github_id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, google_id, github_id,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Lookup is case-insensitive; addresses are compared lowercased.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, google_id, github_id,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by Google account id
    pub async fn find_by_google_id(
        pool: &PgPool,
        google_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, google_id, github_id,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE google_id = $1
            "#,
        )
        .bind(google_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by GitHub account id
    pub async fn find_by_github_id(
        pool: &PgPool,
        github_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, google_id, github_id,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE github_id = $1
            "#,
        )
        .bind(github_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Attaches a Google account id to an existing user
    ///
    /// Used when an OAuth login arrives for an email that already has an
    /// account; linking keeps one canonical row per person instead of
    /// creating a duplicate. Only succeeds if the user has no Google id yet.
    pub async fn link_google(
        pool: &PgPool,
        id: Uuid,
        google_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET google_id = $2, updated_at = NOW()
            WHERE id = $1 AND google_id IS NULL
            RETURNING id, name, email, password_hash, google_id, github_id,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(id)
        .bind(google_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Attaches a GitHub account id to an existing user
    ///
    /// Same linking semantics as [`User::link_google`].
    pub async fn link_github(
        pool: &PgPool,
        id: Uuid,
        github_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET github_id = $2, updated_at = NOW()
            WHERE id = $1 AND github_id IS NULL
            RETURNING id, name, email, password_hash, google_id, github_id,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(id)
        .bind(github_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates the last login timestamp, typically after successful
    /// authentication
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
