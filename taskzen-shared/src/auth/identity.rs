/// Identity resolution
///
/// Reconciles the three identity sources (password, Google, GitHub) into
/// one canonical user record. Each entry point either finds the existing
/// user for an identity assertion or creates one; repeated calls with the
/// same external identity always resolve to the same user id.
///
/// Password resolution deliberately collapses "no such email" and "wrong
/// password" into a single [`IdentityError::InvalidCredentials`] so the
/// response cannot be used to enumerate accounts.
///
/// An OAuth assertion whose provider id is unknown but whose email matches
/// an existing account gets the provider id linked onto that account
/// instead of creating a duplicate row, preserving email uniqueness.
use sqlx::PgPool;

use super::password::verify_password;
use crate::models::user::{CreateUser, User};

/// Error type for identity resolution
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Unknown email or wrong password; the two are indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The asserted email already belongs to an account linked to a
    /// different account at the same provider
    #[error("Email is already linked to another {provider} account")]
    AlreadyLinked {
        /// Provider name ("google" or "github")
        provider: &'static str,
    },

    /// Underlying store failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A verified profile delivered by an OAuth provider redirect flow
///
/// The transport layer has already validated the provider's response; this
/// module trusts the assertion as delivered.
#[derive(Debug, Clone)]
pub struct ExternalProfile {
    /// Provider-scoped stable account id
    pub provider_id: String,

    /// Display name reported by the provider
    pub name: String,

    /// Email reported by the provider, if any
    pub email: Option<String>,
}

/// Resolves an email/password pair to its user
///
/// # Errors
///
/// Returns [`IdentityError::InvalidCredentials`] when the email is unknown,
/// the account has no password identity, or the password does not verify.
/// The caller cannot tell which.
pub async fn resolve_by_password(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<User, IdentityError> {
    let user = User::find_by_email(pool, email)
        .await?
        .ok_or(IdentityError::InvalidCredentials)?;

    // OAuth-only accounts have no password identity; same error as a
    // mismatch so nothing is revealed about the account
    let hash = user
        .password_hash
        .as_deref()
        .ok_or(IdentityError::InvalidCredentials)?;

    if !verify_password(password, hash) {
        return Err(IdentityError::InvalidCredentials);
    }

    Ok(user)
}

/// Resolves a Google profile to its user, creating or linking as needed
///
/// Lookup order: Google id, then email. An email match gets the Google id
/// attached to the existing account; only a previously-unseen identity
/// creates a new user.
pub async fn resolve_or_create_google(
    pool: &PgPool,
    profile: &ExternalProfile,
) -> Result<User, IdentityError> {
    if let Some(user) = User::find_by_google_id(pool, &profile.provider_id).await? {
        return Ok(user);
    }

    if let Some(email) = &profile.email {
        if let Some(existing) = User::find_by_email(pool, email).await? {
            if let Some(linked) = User::link_google(pool, existing.id, &profile.provider_id).await?
            {
                tracing::info!(user_id = %linked.id, "Linked Google identity to existing account");
                return Ok(linked);
            }

            // Linking only fails when a google_id is already present: either
            // a concurrent callback for this same identity won the race, or
            // the email-matched account belongs to a different Google account
            if let Some(user) = User::find_by_google_id(pool, &profile.provider_id).await? {
                return Ok(user);
            }
            return Err(IdentityError::AlreadyLinked { provider: "google" });
        }
    }

    let user = User::create(
        pool,
        CreateUser {
            name: profile.name.clone(),
            email: profile.email.clone(),
            password_hash: None,
            google_id: Some(profile.provider_id.clone()),
            github_id: None,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Created user from Google profile");
    Ok(user)
}

/// Resolves a GitHub profile to its user, creating or linking as needed
///
/// Symmetric to [`resolve_or_create_google`], keyed on the GitHub id. When
/// the provider supplies no email, the email stays unset rather than
/// guessed, and no linking by email is attempted.
pub async fn resolve_or_create_github(
    pool: &PgPool,
    profile: &ExternalProfile,
) -> Result<User, IdentityError> {
    if let Some(user) = User::find_by_github_id(pool, &profile.provider_id).await? {
        return Ok(user);
    }

    if let Some(email) = &profile.email {
        if let Some(existing) = User::find_by_email(pool, email).await? {
            if let Some(linked) = User::link_github(pool, existing.id, &profile.provider_id).await?
            {
                tracing::info!(user_id = %linked.id, "Linked GitHub identity to existing account");
                return Ok(linked);
            }

            if let Some(user) = User::find_by_github_id(pool, &profile.provider_id).await? {
                return Ok(user);
            }
            return Err(IdentityError::AlreadyLinked { provider: "github" });
        }
    }

    let user = User::create(
        pool,
        CreateUser {
            name: profile.name.clone(),
            email: profile.email.clone(),
            password_hash: None,
            google_id: None,
            github_id: Some(profile.provider_id.clone()),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Created user from GitHub profile");
    Ok(user)
}
