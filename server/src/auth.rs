// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Accounts and bearer-token authentication.
use anyhow::{Context, Result};
use axum::{
    extract::{FromRequestParts, Json, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use common::{AuthResponse, LoginPayload, RegisterPayload, User};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::database;
use crate::handlers::AppError;
use crate::state::AppState;

/// How long an issued token stays valid.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// JWT payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing keys and hashing parameters shared by the auth handlers.
pub struct AuthSettings {
    encoding: EncodingKey,
    decoding: DecodingKey,
    bcrypt_cost: u32,
}

impl AuthSettings {
    pub fn new(secret: &str, bcrypt_cost: u32) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            bcrypt_cost,
        }
    }

    /// Issues an HS256 token for `user`. Expiry is checked against wall-clock
    /// time on verification, so it is stamped with wall-clock time too.
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let issued_at = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).context("Failed to sign token")
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }

    pub async fn hash_password(&self, password: String) -> Result<String> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("Password hashing task failed")?
            .context("Failed to hash password")
    }

    pub async fn verify_password(&self, password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .context("Password verification task failed")?
            .context("Failed to verify password")
    }
}

/// The authenticated caller, taken from the `Authorization: Bearer` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, "Access token required"))?;

        match state.auth.verify_token(token) {
            Ok(claims) => Ok(AuthUser {
                id: claims.sub,
                email: claims.email,
            }),
            Err(e) => {
                warn!("Rejected bearer token: {}", e);
                Err(AppError::new(StatusCode::FORBIDDEN, "Invalid or expired token"))
            }
        }
    }
}

/// Handler for creating an account.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = payload.email.trim().to_lowercase();
    let name = payload.name.trim().to_string();
    debug!("Received registration request for: {}", email);

    if email.is_empty() || payload.password.is_empty() || name.is_empty() {
        return Err(AppError::new(StatusCode::BAD_REQUEST, "All fields are required"));
    }

    if database::find_user_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::new(StatusCode::BAD_REQUEST, "User already exists"));
    }

    let password_hash = state.auth.hash_password(payload.password).await?;
    let user =
        database::create_user(&state.pool, &email, &name, &password_hash, state.clock.now()).await?;
    let token = state.auth.issue_token(&user)?;

    info!("User created successfully: {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            token,
            user,
        }),
    ))
}

/// Handler for exchanging credentials for a token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = payload.email.trim().to_lowercase();

    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "Email and password are required",
        ));
    }

    let invalid = || AppError::new(StatusCode::BAD_REQUEST, "Invalid credentials");

    let Some(stored) = database::find_user_by_email(&state.pool, &email).await? else {
        debug!("Login attempt for unknown email: {}", email);
        return Err(invalid());
    };

    let valid = state
        .auth
        .verify_password(payload.password, stored.password_hash.clone())
        .await?;
    if !valid {
        debug!("Wrong password for: {}", email);
        return Err(invalid());
    }

    let user = stored.into_user();
    let token = state.auth.issue_token(&user)?;
    info!("User logged in: {}", user.email);

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user,
    }))
}

/// Handler returning the caller's account.
pub async fn profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    database::find_user_by_id(&state.pool, auth.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, "User not found"))
}
