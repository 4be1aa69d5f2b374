use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{AccessLevel, PendingRegistration, User};

/// Signup body. Fields default to empty so that missing values surface as
/// validation errors rather than parse errors.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "a@corp.com")]
    pub email: String,

    #[schema(example = "Aa1!aaaa", min_length = 8)]
    pub password: String,

    #[schema(example = "Ada")]
    pub first_name: String,

    #[schema(example = "Byron")]
    pub last_name: String,

    #[schema(example = "Corp")]
    pub organization: String,

    #[schema(example = "inspection")]
    pub access_level: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSummary {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub access_level: AccessLevel,
    #[schema(example = "pending")]
    pub status: String,
}

impl From<&PendingRegistration> for RegistrationSummary {
    fn from(p: &PendingRegistration) -> Self {
        Self {
            email: p.email.clone(),
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            organization: p.organization.clone(),
            access_level: p.access_level,
            status: p.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub success: bool,
    #[schema(example = "Registration request submitted successfully. Pending admin approval.")]
    pub message: String,
    pub data: RegistrationSummary,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    #[schema(example = "a@corp.com")]
    pub email: String,
    #[schema(example = "Aa1!aaaa")]
    pub password: String,
}

/// Public view of an account, as returned by login and session checks.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "Ada Byron")]
    pub name: String,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub access_level: AccessLevel,
    pub organization: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            name: u.full_name(),
            is_admin: u.is_admin,
            is_super_admin: u.is_super_admin,
            access_level: u.access_level,
            organization: u.organization.clone(),
            is_active: u.is_active,
            last_login: u.last_login,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionUserResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HeartbeatResponse {
    pub success: bool,
}
