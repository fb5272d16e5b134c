//! Axum route handlers for registration, login, and profile lookup.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::issue_token;
use crate::errors::AppError;
use crate::models::user::{UserProfile, UserRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

/// POST /api/auth/register
///
/// Creates a user and returns a fresh bearer token. Duplicate emails are a
/// 400, matching the original validation contract.
pub async fn handle_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    if !request.email.contains('@') {
        return Err(AppError::Validation("A valid email address is required".to_string()));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty".to_string()));
    }

    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("Email already registered".to_string()));
    }

    let password_hash = hash_password(&request.password)?;
    // The lookup above is a fast path only: a concurrent registration can
    // still race past it, so the unique constraint is the real guard.
    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, email, full_name, password_hash, is_active, created_at)
        VALUES ($1, $2, $3, $4, TRUE, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.email)
    .bind(&request.full_name)
    .bind(&password_hash)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation("Email already registered".to_string())
        }
        _ => AppError::Database(e),
    })?;

    info!("Registered user {}", user.id);

    let access_token =
        issue_token(&state.config.jwt_secret, user.id).map_err(anyhow::Error::from)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: user.into(),
    }))
}

/// POST /api/auth/login
///
/// Verifies credentials and returns a fresh bearer token. Unknown email and
/// wrong password produce the same 401 so the response does not reveal
/// which one was wrong.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    // Same activity requirement as the AuthUser extractor: a deactivated
    // user must not be able to mint fresh tokens.
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT * FROM users WHERE email = $1 AND is_active = TRUE",
    )
    .bind(&request.email)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let access_token =
        issue_token(&state.config.jwt_secret, user.id).map_err(anyhow::Error::from)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: user.into(),
    }))
}

/// GET /api/user/profile
pub async fn handle_profile(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user.into())
}
