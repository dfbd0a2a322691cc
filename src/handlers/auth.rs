// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Extension, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Config,
    error::AppError,
    models::user::Principal,
    utils::{
        guard,
        jwt::{Claims, sign_jwt, verify_jwt},
    },
};

/// DTO for sign-in: the ID token minted by the identity provider's SDK.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id_token: String,
}

/// Identity-provider token-info response. Read permissively; only the
/// subject and email are required.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Verifies a provider-issued ID token against the token-info endpoint and
/// maps the profile onto our `Principal`.
async fn verify_provider_token(tokeninfo_url: &str, id_token: &str) -> Result<Principal, AppError> {
    let res = reqwest::Client::new()
        .get(tokeninfo_url)
        .query(&[("id_token", id_token)])
        .send()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    if !res.status().is_success() {
        return Err(AppError::AuthError("Invalid identity token".to_string()));
    }

    let info: TokenInfo = res
        .json()
        .await
        .map_err(|_| AppError::AuthError("Invalid identity token".to_string()))?;

    Ok(Principal {
        id: info.sub,
        name: info.name.unwrap_or_else(|| info.email.clone()),
        email: info.email,
        avatar_url: info.picture,
    })
}

/// Exchanges an identity-provider ID token for an application bearer token.
///
/// The provider is the source of truth for who the user is; this endpoint
/// only derives the admin flag and signs our own short-lived JWT.
pub async fn login(
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let principal = verify_provider_token(&config.tokeninfo_url, &payload.id_token).await?;

    let token = sign_jwt(&principal, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "is_admin": principal.is_admin(&config.admin_email),
        "principal": principal,
    })))
}

/// Sign-out acknowledgement. Tokens are stateless; discarding the bearer
/// token client-side and signing out of the provider is all there is.
pub async fn logout() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Returns the current principal and the derived admin flag.
pub async fn me(
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal();
    let is_admin = principal.is_admin(&config.admin_email);

    Ok(Json(json!({
        "principal": principal,
        "is_admin": is_admin,
    })))
}

/// DTO for a route-guard check.
#[derive(Debug, Deserialize)]
pub struct AccessRequest {
    pub path: String,
}

/// The authorization decision for one requested path, evaluated against the
/// (optional) bearer token. An absent or invalid token is "not signed in",
/// never an error: the caller is asking where to send the user, not proving
/// who they are.
pub async fn access(
    State(config): State<Config>,
    headers: HeaderMap,
    Json(payload): Json<AccessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let principal = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .and_then(|token| verify_jwt(token, &config.jwt_secret).ok())
        .map(|claims| claims.principal());

    let decision = guard::decide(principal.as_ref(), &config.admin_email, &payload.path);

    Ok(Json(decision))
}
