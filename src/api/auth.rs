//! Signup/signin endpoints and the bearer-token middleware.
//!
//! The identity provider owns credentials; this layer verifies the token it
//! issued, reconciles the asserted identity onto a local user row, and
//! rejects suspended accounts.

use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, SessionDto, TokenRequest, UserDto};
use crate::entities::users;
use crate::services::{IdentityClaims, ReconcileIntent};

/// Authenticated request context injected by [`auth_middleware`].
#[derive(Clone)]
pub struct CurrentUser {
    pub user: users::Model,
    pub claims: IdentityClaims,
}

/// Verifies the `Authorization: Bearer` token, loads (or creates, on first
/// social sign-in) the local account, and refuses suspended users.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state.shared.verifier.verify(&token)?;

    let user = match state.shared.store.get_user(&claims.sub).await? {
        Some(user) => user,
        None => {
            state
                .shared
                .reconciler
                .reconcile(&claims, ReconcileIntent::Signin)
                .await?
        }
    };

    if user.is_suspended {
        return Err(ApiError::Forbidden("Account is suspended".to_string()));
    }

    tracing::Span::current().record("user_id", user.id.as_str());

    request.extensions_mut().insert(CurrentUser { user, claims });
    Ok(next.run(request).await)
}

/// Second gate for `/admin` routes; runs after [`auth_middleware`].
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.user.is_admin);

    if !is_admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Registers a new host. Rejects the attempt when the email already belongs
/// to a different subject id — the caller should route the user to signin.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<ApiResponse<SessionDto>>, ApiError> {
    let claims = state.shared.verifier.verify(&payload.token)?;

    let user = state
        .shared
        .reconciler
        .reconcile(&claims, ReconcileIntent::Signup)
        .await?;

    // Welcome mail is a courtesy; never block or fail the signup on it.
    let mailer = state.shared.mailer.clone();
    let email = user.email.clone();
    let name = user.name.clone();
    tokio::spawn(async move {
        mailer.send_welcome(&email, name.as_deref()).await;
    });

    state
        .shared
        .audit
        .record("user.signup", &format!("Host account created: {}", user.email), None)
        .await;

    Ok(Json(ApiResponse::success(SessionDto {
        token: payload.token,
        user: UserDto::from_model(user, claims.email_verified),
    })))
}

/// POST /auth/signin
/// Verifies the token and ensures a local account exists; first sign-in
/// through a social provider creates one.
pub async fn signin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<ApiResponse<SessionDto>>, ApiError> {
    let claims = state.shared.verifier.verify(&payload.token)?;

    let user = state
        .shared
        .reconciler
        .reconcile(&claims, ReconcileIntent::Signin)
        .await?;

    if user.is_suspended {
        return Err(ApiError::Forbidden("Account is suspended".to_string()));
    }

    Ok(Json(ApiResponse::success(SessionDto {
        token: payload.token,
        user: UserDto::from_model(user, claims.email_verified),
    })))
}

/// POST /auth/refresh
/// Verifies a freshly issued token. No account is created here.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<ApiResponse<SessionDto>>, ApiError> {
    let claims = state.shared.verifier.verify(&payload.token)?;

    let user = state
        .shared
        .store
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account not found; sign up first".to_string()))?;

    Ok(Json(ApiResponse::success(SessionDto {
        token: payload.token,
        user: UserDto::from_model(user, claims.email_verified),
    })))
}

/// POST /auth/signout
/// Token revocation happens at the provider; the backend just acknowledges.
pub async fn signout() -> Json<ApiResponse<MessageResponse>> {
    Json(ApiResponse::success(MessageResponse::new(
        "Signed out successfully",
    )))
}
