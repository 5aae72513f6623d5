// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account lifecycle endpoints.
//!
//! Registration is OTP-gated: `register` stores an unverified identity and
//! emails a 6-digit code, `verify-otp` redeems the code and issues the
//! first session token. Login, forgot-password, and reset-password follow,
//! all with anti-enumeration behavior: failures never reveal whether an
//! email is registered.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use url::Url;

use crate::{
    auth::{password, tokens, Auth},
    config::{MIN_PASSWORD_LEN, OTP_TTL_MINUTES, RESET_TOKEN_TTL_MINUTES},
    error::ApiError,
    models::{
        AuthResponse, ForgotPasswordRequest, IdentityResponse, LoginRequest, MessageResponse,
        RegisterRequest, ResetPasswordRequest, VerifyOtpRequest,
    },
    state::AppState,
    storage::StoredIdentity,
};

use super::store_error;

/// Minimal plausibility check; real ownership is proven by the OTP email.
fn is_plausible_email(email: &str) -> bool {
    matches!(email.split_once('@'), Some((local, domain)) if !local.is_empty() && !domain.is_empty())
}

fn issue_session(state: &AppState, identity: &StoredIdentity) -> Result<AuthResponse, ApiError> {
    let token = state.sessions.issue(&identity.id).map_err(|e| {
        tracing::error!(error = %e, "session issuance failed");
        ApiError::internal("Failed to issue session token")
    })?;
    Ok(AuthResponse {
        token,
        identity: IdentityResponse::from(identity),
    })
}

fn hash_or_500(plaintext: &str) -> Result<String, ApiError> {
    password::hash_password(plaintext).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::internal("Failed to process password")
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Identity created, verification code emailed", body = MessageResponse),
        (status = 400, description = "Invalid input or email already registered"),
        (status = 500, description = "Verification email could not be sent")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let email = request.email.trim();
    if !is_plausible_email(email) {
        return Err(ApiError::bad_request("A valid email address is required"));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = hash_or_500(&request.password)?;
    let code = tokens::generate_otp();
    let code_digest = tokens::digest(&state.config.jwt_secret, &code);
    let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

    let identity = StoredIdentity::new_pending(
        name,
        email,
        tokens::normalize_email(email),
        password_hash,
        code_digest,
        expires_at,
    );
    state.store.create(&identity).map_err(store_error)?;

    if let Err(e) = state.notifier.send_otp(&identity.email, &identity.name, &code).await {
        tracing::error!(error = %e, "verification email delivery failed");
        return Err(
            ApiError::internal("Failed to send the verification email")
                .with_code("notifier_failed"),
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful. Check your email for a verification code."
                .to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Email verified, session issued", body = AuthResponse),
        (status = 400, description = "Code is invalid or has expired")
    )
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email_key = tokens::normalize_email(request.email.trim());
    let code_digest = tokens::digest(&state.config.jwt_secret, request.otp.trim());

    let identity = state
        .store
        .verify_code(&email_key, &code_digest, Utc::now())
        .map_err(store_error)?;

    Ok(Json(issue_session(&state, &identity)?))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Session issued", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    // One error for unknown email, unverified account, and wrong password,
    // so callers cannot probe which emails are registered.
    let invalid =
        || ApiError::unauthorized("Invalid email or password").with_code("invalid_credentials");

    let email_key = tokens::normalize_email(request.email.trim());
    let identity = state
        .store
        .find_by_email(&email_key)
        .map_err(store_error)?
        .ok_or_else(invalid)?;

    if !identity.verified {
        return Err(invalid());
    }
    if !password::verify_password(&identity.password_hash, &request.password) {
        return Err(invalid());
    }

    Ok(Json(issue_session(&state, &identity)?))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Same response whether or not the email is registered", body = MessageResponse)
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let accepted = MessageResponse {
        message: "If that email is registered, a reset link is on its way.".to_string(),
    };

    let email_key = tokens::normalize_email(request.email.trim());
    let token = tokens::generate_reset_token();
    let token_digest = tokens::digest(&state.config.jwt_secret, &token);
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

    let identity = match state
        .store
        .begin_reset(&email_key, &token_digest, expires_at)
        .map_err(store_error)?
    {
        Some(identity) => identity,
        None => return Ok(Json(accepted)),
    };

    let link = reset_link(&state.config.client_url, &token)?;
    if let Err(e) = state
        .notifier
        .send_password_reset(&identity.email, &identity.name, &link)
        .await
    {
        // Still answer 200: a delivery error must not reveal that the email
        // is registered.
        tracing::error!(error = %e, "reset email delivery failed");
    }

    Ok(Json(accepted))
}

/// Frontend reset page URL carrying the opaque token.
fn reset_link(client_url: &str, token: &str) -> Result<Url, ApiError> {
    let raw = format!("{}/reset-password?token={token}", client_url.trim_end_matches('/'));
    Url::parse(&raw).map_err(|e| {
        tracing::error!(error = %e, "reset link construction failed");
        ApiError::internal("Failed to build the reset link")
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Token is invalid or has expired")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let token_digest = tokens::digest(&state.config.jwt_secret, request.token.trim());
    let password_hash = hash_or_500(&request.password)?;

    state
        .store
        .consume_reset(&token_digest, &password_hash, Utc::now())
        .map_err(store_error)?;

    Ok(Json(MessageResponse {
        message: "Password updated. You can now log in.".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The authenticated identity", body = IdentityResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Identity behind the token no longer exists")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Auth(session): Auth,
) -> Result<Json<IdentityResponse>, ApiError> {
    let identity = state
        .store
        .get(&session.identity_id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("Account no longer exists"))?;

    Ok(Json(IdentityResponse::from(&identity)))
}
