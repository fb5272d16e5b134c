use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::auth::token::verify_token;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

/// Extractor for bearer-protected routes. Verifies the `Authorization`
/// header, then loads the owning user. Any failure short-circuits with 401
/// before the handler body runs.
pub struct AuthUser(pub UserRow);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

        let claims = verify_token(&state.config.jwt_secret, token).map_err(|e| {
            warn!("Token verification failed: {e}");
            AppError::Unauthorized
        })?;

        let user = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE id = $1 AND is_active = TRUE",
        )
        .bind(claims.sub)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser(user))
    }
}
