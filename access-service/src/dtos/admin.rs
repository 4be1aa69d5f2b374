use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{AccessLevel, PendingRegistration, User};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingUserSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub access_level: AccessLevel,
    pub registration_date: DateTime<Utc>,
    #[schema(example = "pending")]
    pub status: String,
}

impl From<&PendingRegistration> for PendingUserSummary {
    fn from(p: &PendingRegistration) -> Self {
        Self {
            id: p.id.clone(),
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            email: p.email.clone(),
            organization: p.organization.clone(),
            access_level: p.access_level,
            registration_date: p.registration_date,
            status: p.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingUsersResponse {
    pub success: bool,
    pub users: Vec<PendingUserSummary>,
    pub from_cache: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ApproveUserRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RejectUserRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,
    #[schema(example = "Organization could not be verified")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovedUser {
    pub id: String,
    pub email: String,
    #[schema(example = "active")]
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApproveUserResponse {
    pub success: bool,
    pub message: String,
    pub user: ApprovedUser,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,
    pub is_active: bool,
}

/// Account view for admin listings. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub access_level: AccessLevel,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub is_active: bool,
    pub status: String,
    pub last_login: Option<DateTime<Utc>>,
    pub registration_date: Option<DateTime<Utc>>,
    pub approval_date: Option<DateTime<Utc>>,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            organization: u.organization.clone(),
            access_level: u.access_level,
            is_admin: u.is_admin,
            is_super_admin: u.is_super_admin,
            is_active: u.is_active,
            status: u.status.clone(),
            last_login: u.last_login,
            registration_date: u.registration_date,
            approval_date: u.approval_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchUsersQuery {
    /// Case-insensitive substring of name, email or organization
    pub query: Option<String>,
    /// One of `all`, `pending`, `active`, `inactive`
    pub status: Option<String>,
}

/// One search result, either a pending registration or an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub access_level: AccessLevel,
    /// `pending` for registrations, `active` or `inactive` for accounts
    pub status: String,
    pub registration_date: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&PendingRegistration> for SearchHit {
    fn from(p: &PendingRegistration) -> Self {
        Self {
            id: p.id.clone(),
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            email: p.email.clone(),
            organization: p.organization.clone(),
            access_level: p.access_level,
            status: p.status.as_str().to_string(),
            registration_date: Some(p.registration_date),
            last_login: None,
        }
    }
}

impl From<&User> for SearchHit {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            organization: u.organization.clone(),
            access_level: u.access_level,
            status: if u.is_active { "active" } else { "inactive" }.to_string(),
            registration_date: u.registration_date,
            last_login: u.last_login,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchUsersResponse {
    pub success: bool,
    pub users: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub active_users: u64,
    pub users_by_access_level: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserStatsResponse {
    pub success: bool,
    pub data: UserStats,
}
