pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::AccessConfig;
use crate::services::{
    AdminService, AuthService, Clock, CredentialStore, JwtService, ListingCache, ListingService,
    RegistrationService,
};
use crate::utils::PasswordHasher;
use service_core::error::AppError;
use std::sync::Arc;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::check_session,
        handlers::auth::heartbeat,
        handlers::admin::pending_users,
        handlers::admin::approve_user,
        handlers::admin::reject_user,
        handlers::admin::set_user_status,
        handlers::admin::detailed_users,
        handlers::admin::active_users,
        handlers::admin::user_stats,
        handlers::admin::search_users,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::SignupRequest,
            dtos::auth::SignupResponse,
            dtos::auth::RegistrationSummary,
            dtos::auth::LoginRequest,
            dtos::auth::UserProfile,
            dtos::auth::SessionUserResponse,
            dtos::auth::HeartbeatResponse,
            dtos::admin::PendingUserSummary,
            dtos::admin::PendingUsersResponse,
            dtos::admin::ApproveUserRequest,
            dtos::admin::ApproveUserResponse,
            dtos::admin::ApprovedUser,
            dtos::admin::RejectUserRequest,
            dtos::admin::UserStatusRequest,
            dtos::admin::UserSummary,
            dtos::admin::UsersResponse,
            dtos::admin::SearchHit,
            dtos::admin::SearchUsersResponse,
            dtos::admin::UserStats,
            dtos::admin::UserStatsResponse,
            models::AccessLevel,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Signup, login and logout"),
        (name = "Session", description = "Cookie session checks and presence"),
        (name = "Admin", description = "Registration approval and user listings"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    middleware::SESSION_COOKIE,
                ))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AccessConfig,
    pub store: Arc<dyn CredentialStore>,
    pub jwt: JwtService,
    pub registration_service: RegistrationService,
    pub auth_service: AuthService,
    pub admin_service: AdminService,
    pub listing_service: ListingService,
    pub login_rate_limiter: IpRateLimiter,
    pub signup_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wire the services over a credential store and clock.
    pub fn new(
        config: AccessConfig,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let jwt = JwtService::new(&config.jwt, clock.clone()).map_err(AppError::ConfigError)?;
        let hasher = PasswordHasher::new(config.password.hash_cost);

        let pending_cache = Arc::new(ListingCache::new(
            chrono::Duration::seconds(config.listing.pending_cache_ttl_seconds),
            clock.clone(),
        ));

        let registration_service = RegistrationService::new(store.clone(), hasher, clock.clone());
        let auth_service = AuthService::new(store.clone(), hasher, jwt.clone(), clock.clone());
        let admin_service = AdminService::new(store.clone(), clock.clone());
        let listing_service = ListingService::new(
            store.clone(),
            pending_cache,
            clock,
            config.listing.pending_list_limit,
            chrono::Duration::minutes(config.listing.active_window_minutes),
        );

        let login_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        );
        let signup_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.signup_attempts,
            config.rate_limit.signup_window_seconds,
        );
        let ip_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.global_ip_limit,
            config.rate_limit.global_ip_window_seconds,
        );

        Ok(Self {
            config,
            store,
            jwt,
            registration_service,
            auth_service,
            admin_service,
            listing_service,
            login_rate_limiter,
            signup_rate_limiter,
            ip_rate_limiter,
        })
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Routes behind the session gate; /admin paths additionally need admin access
    let gated_routes = Router::new()
        .route("/auth/check-session", get(handlers::auth::check_session))
        .route("/auth/heartbeat", post(handlers::auth::heartbeat))
        .route("/admin/pending-users", get(handlers::admin::pending_users))
        .route("/admin/approve-user", post(handlers::admin::approve_user))
        .route("/admin/reject-user", post(handlers::admin::reject_user))
        .route("/admin/user-status", post(handlers::admin::set_user_status))
        .route("/admin/detailed-users", get(handlers::admin::detailed_users))
        .route("/admin/active-users", get(handlers::admin::active_users))
        .route("/admin/user-stats", get(handlers::admin::user_stats))
        .route("/admin/search-users", get(handlers::admin::search_users))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session_gate_middleware,
        ));

    let login_route = Router::new()
        .route("/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let signup_route = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .layer(from_fn_with_state(
            state.signup_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let ip_limiter = state.ip_rate_limiter.clone();

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/logout", post(handlers::auth::logout))
        .merge(login_route)
        .merge(signup_route)
        .merge(gated_routes)
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|o| {
                            o.parse::<axum::http::HeaderValue>()
                                .map_err(|e| {
                                    tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                                })
                                .ok()
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                    axum::http::header::HeaderName::from_static("x-request-id"),
                ])
                .allow_credentials(true),
        );

    Ok(app)
}

/// Liveness plus a database ping
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": state.config.environment.as_str(),
    })))
}
