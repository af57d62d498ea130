use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::validation::{validate_email, validate_password, validate_username};
use super::{ApiError, ApiResponse, AppState, LoginRequest, RegisterRequest, TokenResponse, UserDto};
use crate::auth::keys::JwksDocument;
use crate::auth::rbac::Identity;
use crate::services::auth::Registration;

// ============================================================================
// Middleware
// ============================================================================

/// Request-authentication middleware for all protected routes.
///
/// Extracts the bearer token, verifies it (signature, issuer, expiry),
/// resolves the closed-enum [`Identity`], and attaches it to the request.
/// Any verification failure is a uniform 401; an unknown role claim is a
/// 403, since the caller is authenticated but can never be authorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()) else {
        return Err(ApiError::unauthenticated("Missing bearer token"));
    };

    let claims = state
        .tokens()
        .verify(&token)
        .map_err(|_| ApiError::unauthenticated("Invalid or expired token"))?;

    let identity = Identity::from_claims(&claims)?;

    tracing::Span::current().record("user_id", identity.user_id);

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
/// The scheme is matched case-insensitively per RFC 7235.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some((scheme, token)) = auth_str.trim().split_once(' ')
        && scheme.eq_ignore_ascii_case("Bearer")
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
/// Verify credentials and return a signed session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    validate_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    // InvalidCredentials is uniform for unknown email and wrong password;
    // store failures keep their own variant and surface as 5xx.
    let login = state.auth().login(&payload.email, &payload.password).await?;

    tracing::info!(user_id = login.user_id, "User logged in");

    Ok(Json(ApiResponse::success(TokenResponse {
        access_token: login.token.access_token,
        token_type: "bearer",
        expires_in: login.token.expires_in,
        user_id: login.user_id,
        role: login.role,
    })))
}

/// POST /api/auth/register
/// Create an account. The role is always USER, whatever the payload says.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    if payload.role.is_some() {
        tracing::debug!("Ignoring role field in registration payload");
    }

    let record = state
        .auth()
        .register(Registration {
            email: payload.email,
            username: payload.username,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    tracing::info!(user_id = record.0.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(record))),
    ))
}

/// GET /.well-known/jwks.json
/// Public-key discovery document; no auth required.
pub async fn jwks(State(state): State<Arc<AppState>>) -> Json<JwksDocument> {
    Json(state.keys().jwks())
}
