use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        admin::{
            ApproveUserRequest, ApproveUserResponse, ApprovedUser, PendingUsersResponse,
            RejectUserRequest, SearchUsersQuery, SearchUsersResponse, UserStatsResponse,
            UserStatusRequest, UsersResponse,
        },
        ErrorResponse, MessageResponse,
    },
    middleware::AuthenticatedUser,
    services::SearchStatus,
    utils::ValidatedJson,
    AppState,
};

/// List registrations awaiting approval
#[utoipa::path(
    get,
    path = "/admin/pending-users",
    responses(
        (status = 200, description = "Pending registrations, newest first", body = PendingUsersResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("session_cookie" = []))
)]
pub async fn pending_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (users, from_cache) = state.listing_service.pending_users().await?;
    Ok(Json(PendingUsersResponse {
        success: true,
        users,
        from_cache,
    }))
}

/// Approve a pending registration
#[utoipa::path(
    post,
    path = "/admin/approve-user",
    request_body = ApproveUserRequest,
    responses(
        (status = 200, description = "Account created", body = ApproveUserResponse),
        (status = 400, description = "Missing user id or account already exists", body = ErrorResponse),
        (status = 404, description = "Pending user not found", body = ErrorResponse),
        (status = 409, description = "Registration already being processed", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("session_cookie" = []))
)]
pub async fn approve_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<ApproveUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(admin_id = %admin.user_id, pending_id = %req.user_id, "Approve requested");
    let user = state.admin_service.approve(&req.user_id).await?;
    Ok(Json(ApproveUserResponse {
        success: true,
        message: "User approved successfully".to_string(),
        user: ApprovedUser {
            id: user.id,
            email: user.email,
            status: user.status,
        },
    }))
}

/// Reject a pending registration
#[utoipa::path(
    post,
    path = "/admin/reject-user",
    request_body = RejectUserRequest,
    responses(
        (status = 200, description = "Registration rejected", body = MessageResponse),
        (status = 400, description = "Missing user id", body = ErrorResponse),
        (status = 404, description = "Pending user not found", body = ErrorResponse),
        (status = 409, description = "Registration already being processed", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("session_cookie" = []))
)]
pub async fn reject_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<RejectUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(admin_id = %admin.user_id, pending_id = %req.user_id, "Reject requested");
    state.admin_service.reject(&req.user_id, req.reason).await?;
    Ok(Json(MessageResponse::ok("User rejected successfully")))
}

/// Enable or disable an account
#[utoipa::path(
    post,
    path = "/admin/user-status",
    request_body = UserStatusRequest,
    responses(
        (status = 200, description = "Account updated", body = MessageResponse),
        (status = 400, description = "Missing user id", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("session_cookie" = []))
)]
pub async fn set_user_status(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<UserStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(admin_id = %admin.user_id, user_id = %req.user_id, is_active = req.is_active, "Account status change requested");
    state
        .admin_service
        .set_user_active(&req.user_id, req.is_active)
        .await?;
    let message = if req.is_active {
        "User activated"
    } else {
        "User deactivated"
    };
    Ok(Json(MessageResponse::ok(message)))
}

/// List every account
#[utoipa::path(
    get,
    path = "/admin/detailed-users",
    responses(
        (status = 200, description = "All accounts", body = UsersResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("session_cookie" = []))
)]
pub async fn detailed_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.listing_service.all_users().await?;
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

/// List accounts seen within the active window
#[utoipa::path(
    get,
    path = "/admin/active-users",
    responses(
        (status = 200, description = "Recently active accounts", body = UsersResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("session_cookie" = []))
)]
pub async fn active_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.listing_service.active_users().await?;
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

/// Account counts for the dashboard
#[utoipa::path(
    get,
    path = "/admin/user-stats",
    responses(
        (status = 200, description = "Account statistics", body = UserStatsResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("session_cookie" = []))
)]
pub async fn user_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.listing_service.stats().await?;
    Ok(Json(UserStatsResponse {
        success: true,
        data,
    }))
}

/// Search registrations and accounts
#[utoipa::path(
    get,
    path = "/admin/search-users",
    params(SearchUsersQuery),
    responses(
        (status = 200, description = "Matching registrations and accounts", body = SearchUsersResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("session_cookie" = []))
)]
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status: SearchStatus = match params.status.as_deref() {
        Some(s) => s.parse()?,
        None => SearchStatus::default(),
    };

    let users = state
        .listing_service
        .search(params.query.as_deref(), status)
        .await?;
    Ok(Json(SearchUsersResponse {
        success: true,
        users,
    }))
}
