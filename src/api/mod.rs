// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    market::{MarketStats, MarketTicker},
    models::{
        AuthResponse, FavoriteRequest, FavoritesResponse, ForgotPasswordRequest, IdentityResponse,
        LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest, Symbol,
        VerifyOtpRequest,
    },
    state::AppState,
    storage::IdentityStoreError,
};

pub mod auth;
pub mod favorites;
pub mod health;
pub mod market;

/// Map storage failures onto the API error taxonomy.
///
/// The three domain variants keep their stable codes; anything else is an
/// internal failure whose detail goes to the log, not the client.
pub(crate) fn store_error(err: IdentityStoreError) -> ApiError {
    match err {
        IdentityStoreError::DuplicateEmail => {
            ApiError::bad_request("An account with this email already exists")
                .with_code("duplicate_identity")
        }
        IdentityStoreError::CodeInvalidOrExpired => {
            ApiError::bad_request("Verification code is invalid or has expired")
                .with_code("invalid_or_expired_code")
        }
        IdentityStoreError::ResetTokenInvalidOrExpired => {
            ApiError::bad_request("Reset token is invalid or has expired")
                .with_code("invalid_or_expired_token")
        }
        IdentityStoreError::NotFound(_) => ApiError::not_found("Account no longer exists"),
        other => {
            tracing::error!(error = %other, "identity store failure");
            ApiError::internal("Internal storage failure")
        }
    }
}

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/me", get(auth::me));

    let market_routes = Router::new()
        .route("/currencies", get(market::currencies))
        .route("/trending", get(market::trending))
        .route("/top-gainers", get(market::top_gainers))
        .route("/top-losers", get(market::top_losers))
        .route("/spotdata", get(market::spotdata))
        .route("/stats", get(market::stats))
        .route(
            "/favorites",
            get(favorites::list_favorites).post(favorites::add_favorite),
        )
        .route("/favorites/{symbol}", delete(favorites::remove_favorite));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/market", market_routes);

    let app_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes)
        .with_state(state);

    Router::new()
        .merge(app_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

/// Registers the bearer scheme referenced by the authenticated paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::verify_otp,
        auth::login,
        auth::forgot_password,
        auth::reset_password,
        auth::me,
        market::currencies,
        market::trending,
        market::top_gainers,
        market::top_losers,
        market::spotdata,
        market::stats,
        favorites::add_favorite,
        favorites::remove_favorite,
        favorites::list_favorites,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            RegisterRequest,
            VerifyOtpRequest,
            LoginRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            IdentityResponse,
            AuthResponse,
            MessageResponse,
            Symbol,
            FavoriteRequest,
            FavoritesResponse,
            MarketTicker,
            MarketStats,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, verification, and sessions"),
        (name = "Market", description = "Live market views derived per request"),
        (name = "Favorites", description = "Per-identity favorite symbols"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/auth/register",
            "/api/auth/verify-otp",
            "/api/auth/login",
            "/api/auth/forgot-password",
            "/api/auth/reset-password",
            "/api/auth/me",
            "/api/market/currencies",
            "/api/market/trending",
            "/api/market/top-gainers",
            "/api/market/top-losers",
            "/api/market/spotdata",
            "/api/market/stats",
            "/api/market/favorites",
            "/api/market/favorites/{symbol}",
            "/health",
            "/health/live",
            "/health/ready",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {expected}"
            );
        }
    }
}
