/// Authentication gate
///
/// Request-level middleware guarding every identity-bearing route. Per
/// request it:
///
/// 1. extracts the bearer credential from the Authorization header,
/// 2. validates the token signature and expiry,
/// 3. loads the user behind the verified subject id (a user deleted after
///    issuance is rejected here, not at signing time),
/// 4. attaches the resolved profile to request extensions and lets the
///    request proceed.
///
/// Every failure leg terminates with the same 401 kind. The gate never
/// mutates state. Downstream handlers receive the caller via
/// `Extension<CurrentUser>` and must use its id as the owner for all task
/// operations, never a client-supplied id.
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::ApiError};
use taskzen_shared::{auth::jwt::validate_token, models::user::{User, UserProfile}};

/// The authenticated caller, as attached by [`require_auth`]
///
/// Carries the public profile only; the password digest never enters the
/// request context.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

impl CurrentUser {
    /// The caller's user id, the owner key for every task operation
    pub fn id(&self) -> uuid::Uuid {
        self.0.id
    }
}

/// Bearer-token authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is missing or malformed, the
/// token fails validation, or the subject no longer exists.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, state.jwt_secret())?;

    // The token may outlive its user; resolve the subject on every request
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    req.extensions_mut()
        .insert(CurrentUser(UserProfile::from(user)));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_current_user_exposes_id() {
        let id = Uuid::new_v4();
        let current = CurrentUser(UserProfile {
            id,
            name: "Ann".to_string(),
            email: Some("a@x.com".to_string()),
            created_at: Utc::now(),
        });

        assert_eq!(current.id(), id);
    }

    // Gate behavior over real requests (missing header, expired token,
    // deleted subject) is covered in tests/integration_test.rs.
}
