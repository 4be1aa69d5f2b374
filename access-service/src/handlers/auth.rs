use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{
            HeartbeatResponse, LoginRequest, RegistrationSummary, SessionUserResponse,
            SignupRequest, SignupResponse, UserProfile,
        },
        ErrorResponse, MessageResponse,
    },
    middleware::{
        session::{expired_session_cookie, session_cookie},
        AuthenticatedUser,
    },
    utils::JsonBody,
    AppState,
};

/// Submit a registration for admin approval
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Registration stored, pending approval", body = SignupResponse),
        (status = 400, description = "Validation, email policy or duplicate registration", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pending = state.registration_service.register(req).await?;
    Ok((
        StatusCode::OK,
        Json(SignupResponse {
            success: true,
            message: "Registration request submitted successfully. Pending admin approval."
                .to_string(),
            data: RegistrationSummary::from(&pending),
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = SessionUserResponse),
        (status = 400, description = "Missing email or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account inactive or pending approval", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.auth_service.login(req).await?;

    let cookie = session_cookie(
        outcome.token.token,
        state.jwt.session_expiry(),
        state.config.security.secure_cookies,
    );

    Ok((
        jar.add(cookie),
        Json(SessionUserResponse {
            success: true,
            user: UserProfile::from(&outcome.user),
        }),
    ))
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out successfully", body = MessageResponse)
    ),
    tag = "Authentication"
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(expired_session_cookie(state.config.security.secure_cookies)),
        Json(MessageResponse::ok("Logged out successfully")),
    )
}

/// Return the account behind the current session
#[utoipa::path(
    get,
    path = "/auth/check-session",
    responses(
        (status = 200, description = "Session is valid", body = SessionUserResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Account inactive", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Session",
    security(("session_cookie" = []))
)]
pub async fn check_session(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.current_user(&identity).await?;
    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(SessionUserResponse {
            success: true,
            user: UserProfile::from(&user),
        }),
    ))
}

/// Refresh the caller's presence record
#[utoipa::path(
    post,
    path = "/auth/heartbeat",
    responses(
        (status = 200, description = "Presence recorded", body = HeartbeatResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    ),
    tag = "Session",
    security(("session_cookie" = []))
)]
pub async fn heartbeat(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.heartbeat(&identity).await?;
    Ok(Json(HeartbeatResponse { success: true }))
}
