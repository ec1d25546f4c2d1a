/// Google and GitHub login flows
///
/// Authorization-code flow with PKCE for both providers. The CSRF state and
/// PKCE verifier for each in-flight login live in the `oauth_states` table
/// with a 10-minute expiry and are consumed atomically at callback time.
///
/// A successful callback resolves the provider profile to a canonical user,
/// issues a short-lived token (oauth TTL, not the session TTL), and
/// redirects to the frontend callback URL with the token attached. Any
/// failure redirects to the frontend failure URL; the end user never sees a
/// raw provider error.
///
/// # Endpoints
///
/// - `GET /auth/google` / `GET /auth/google/callback`
/// - `GET /auth/github` / `GET /auth/github/callback`
use axum::{
    extract::{Query, State},
    response::Redirect,
};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    app::AppState,
    config::OAuthProvider,
    error::{ApiError, ApiResult},
};
use taskzen_shared::auth::identity::{self, ExternalProfile};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GITHUB_EMAILS_URL: &str = "https://api.github.com/user/emails";

/// Query parameters delivered to the callback endpoints
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code, absent when the provider reports an error
    pub code: Option<String>,

    /// CSRF state issued at authorize time
    pub state: Option<String>,

    /// Provider-reported error, e.g. `access_denied`
    pub error: Option<String>,
}

/// Google user info from the userinfo API
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    email: String,
    name: Option<String>,
}

/// GitHub user info from the REST API
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    email: Option<String>,
    name: Option<String>,
}

/// GitHub email entry from `/user/emails`
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// OAuth client type with auth URL and token URL set
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

fn build_client(
    provider: &OAuthProvider,
    auth_url: &str,
    token_url: &str,
) -> ApiResult<ConfiguredClient> {
    let auth_url = AuthUrl::new(auth_url.to_string())
        .map_err(|e| ApiError::InternalError(format!("Invalid auth URL: {}", e)))?;
    let token_url = TokenUrl::new(token_url.to_string())
        .map_err(|e| ApiError::InternalError(format!("Invalid token URL: {}", e)))?;
    let redirect_url = RedirectUrl::new(provider.redirect_url.clone())
        .map_err(|e| ApiError::InternalError(format!("Invalid redirect URL: {}", e)))?;

    Ok(BasicClient::new(ClientId::new(provider.client_id.clone()))
        .set_client_secret(ClientSecret::new(provider.client_secret.clone()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_redirect_uri(redirect_url))
}

/// Persists the CSRF state + PKCE verifier for an in-flight login
async fn store_state(
    pool: &PgPool,
    provider: &str,
    state: &str,
    verifier: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO oauth_states (state, provider, pkce_verifier, expires_at)
        VALUES ($1, $2, $3, NOW() + INTERVAL '10 minutes')
        "#,
    )
    .bind(state)
    .bind(provider)
    .bind(verifier)
    .execute(pool)
    .await?;

    Ok(())
}

/// Retrieves and deletes the state row in one statement, validating CSRF
/// state and expiry together
async fn consume_state(pool: &PgPool, provider: &str, state: &str) -> ApiResult<String> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        DELETE FROM oauth_states
        WHERE state = $1 AND provider = $2 AND expires_at > NOW()
        RETURNING pkce_verifier
        "#,
    )
    .bind(state)
    .bind(provider)
    .fetch_optional(pool)
    .await?;

    row.map(|(verifier,)| verifier)
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired OAuth state".to_string()))
}

/// Exchanges the callback code for a provider access token
async fn exchange_code(
    client: &ConfiguredClient,
    code: String,
    pkce_verifier: String,
) -> ApiResult<String> {
    // Token exchange must not follow redirects
    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let token_result = client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
        .request_async(&http_client)
        .await
        .map_err(|e| ApiError::UpstreamFailure(format!("Token exchange failed: {}", e)))?;

    Ok(token_result.access_token().secret().clone())
}

async fn fetch_google_profile(access_token: &str) -> ApiResult<ExternalProfile> {
    let api_client = reqwest::Client::new();

    let google_user: GoogleUser = api_client
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| ApiError::UpstreamFailure(format!("Google userinfo request failed: {}", e)))?
        .error_for_status()
        .map_err(|e| ApiError::UpstreamFailure(format!("Google userinfo rejected: {}", e)))?
        .json()
        .await
        .map_err(|e| ApiError::UpstreamFailure(format!("Google userinfo malformed: {}", e)))?;

    let name = google_user
        .name
        .unwrap_or_else(|| google_user.email.clone());

    Ok(ExternalProfile {
        provider_id: google_user.id,
        name,
        email: Some(google_user.email),
    })
}

async fn fetch_github_profile(access_token: &str) -> ApiResult<ExternalProfile> {
    let api_client = reqwest::Client::new();

    let github_user: GitHubUser = api_client
        .get(GITHUB_USER_URL)
        .bearer_auth(access_token)
        .header("User-Agent", "TaskZen")
        .send()
        .await
        .map_err(|e| ApiError::UpstreamFailure(format!("GitHub user request failed: {}", e)))?
        .error_for_status()
        .map_err(|e| ApiError::UpstreamFailure(format!("GitHub user rejected: {}", e)))?
        .json()
        .await
        .map_err(|e| ApiError::UpstreamFailure(format!("GitHub user malformed: {}", e)))?;

    // The profile email is often private; ask the emails endpoint for the
    // primary verified address. If there is none, the email stays unset.
    let email = match github_user.email {
        Some(email) => Some(email),
        None => fetch_github_primary_email(&api_client, access_token).await,
    };

    Ok(ExternalProfile {
        provider_id: github_user.id.to_string(),
        name: github_user.name.unwrap_or(github_user.login),
        email,
    })
}

/// Best-effort lookup of the primary verified email; None when the account
/// has none or the endpoint fails
async fn fetch_github_primary_email(
    api_client: &reqwest::Client,
    access_token: &str,
) -> Option<String> {
    let response = api_client
        .get(GITHUB_EMAILS_URL)
        .bearer_auth(access_token)
        .header("User-Agent", "TaskZen")
        .send()
        .await
        .ok()?
        .error_for_status()
        .ok()?;

    let emails: Vec<GitHubEmail> = response.json().await.ok()?;
    emails
        .into_iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email)
}

/// Starts the Google login flow
///
/// Redirects to Google's consent screen with `openid email profile` scopes
/// and a fresh PKCE challenge.
pub async fn google_authorize(State(state): State<AppState>) -> ApiResult<Redirect> {
    let provider = state.config.oauth.google.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Google login is not configured".to_string())
    })?;

    let client = build_client(provider, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL)?;
    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (auth_url, csrf_state) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .set_pkce_challenge(pkce_challenge)
        .url();

    store_state(
        &state.db,
        "google",
        csrf_state.secret(),
        pkce_verifier.secret(),
    )
    .await?;

    Ok(Redirect::temporary(auth_url.as_str()))
}

/// Completes the Google login flow
///
/// Always responds with a redirect: to the frontend callback URL carrying a
/// fresh token on success, to the frontend failure URL otherwise.
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match google_callback_inner(&state, params).await {
        Ok(token) => Redirect::temporary(&format!(
            "{}?token={}",
            state.config.oauth.frontend_callback_url, token
        )),
        Err(err) => {
            tracing::warn!("Google login failed: {}", err);
            Redirect::temporary(&state.config.oauth.frontend_failure_url)
        }
    }
}

async fn google_callback_inner(state: &AppState, params: CallbackParams) -> ApiResult<String> {
    let provider = state.config.oauth.google.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Google login is not configured".to_string())
    })?;

    if let Some(error) = params.error {
        return Err(ApiError::UpstreamFailure(format!(
            "Google reported: {}",
            error
        )));
    }
    let code = params
        .code
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;
    let csrf_state = params
        .state
        .ok_or_else(|| ApiError::BadRequest("Missing OAuth state".to_string()))?;

    let pkce_verifier = consume_state(&state.db, "google", &csrf_state).await?;

    let client = build_client(provider, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL)?;
    let access_token = exchange_code(&client, code, pkce_verifier).await?;

    let profile = fetch_google_profile(&access_token).await?;
    let user = identity::resolve_or_create_google(&state.db, &profile).await?;

    state.issue_oauth_token(user.id)
}

/// Starts the GitHub login flow
pub async fn github_authorize(State(state): State<AppState>) -> ApiResult<Redirect> {
    let provider = state.config.oauth.github.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("GitHub login is not configured".to_string())
    })?;

    let client = build_client(provider, GITHUB_AUTH_URL, GITHUB_TOKEN_URL)?;
    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (auth_url, csrf_state) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("user:email".to_string()))
        .add_scope(Scope::new("read:user".to_string()))
        .set_pkce_challenge(pkce_challenge)
        .url();

    store_state(
        &state.db,
        "github",
        csrf_state.secret(),
        pkce_verifier.secret(),
    )
    .await?;

    Ok(Redirect::temporary(auth_url.as_str()))
}

/// Completes the GitHub login flow
pub async fn github_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match github_callback_inner(&state, params).await {
        Ok(token) => Redirect::temporary(&format!(
            "{}?token={}",
            state.config.oauth.frontend_callback_url, token
        )),
        Err(err) => {
            tracing::warn!("GitHub login failed: {}", err);
            Redirect::temporary(&state.config.oauth.frontend_failure_url)
        }
    }
}

async fn github_callback_inner(state: &AppState, params: CallbackParams) -> ApiResult<String> {
    let provider = state.config.oauth.github.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("GitHub login is not configured".to_string())
    })?;

    if let Some(error) = params.error {
        return Err(ApiError::UpstreamFailure(format!(
            "GitHub reported: {}",
            error
        )));
    }
    let code = params
        .code
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;
    let csrf_state = params
        .state
        .ok_or_else(|| ApiError::BadRequest("Missing OAuth state".to_string()))?;

    let pkce_verifier = consume_state(&state.db, "github", &csrf_state).await?;

    let client = build_client(provider, GITHUB_AUTH_URL, GITHUB_TOKEN_URL)?;
    let access_token = exchange_code(&client, code, pkce_verifier).await?;

    let profile = fetch_github_profile(&access_token).await?;
    let user = identity::resolve_or_create_github(&state.db, &profile).await?;

    state.issue_oauth_token(user.id)
}
