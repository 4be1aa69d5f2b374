//! Registrations awaiting an admin decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccessLevel;

/// Lifecycle of a pending record. `Promoting` and `Rejecting` are claims held
/// while the record is copied into another collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    Pending,
    Promoting,
    Rejecting,
}

impl PendingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingStatus::Pending => "pending",
            PendingStatus::Promoting => "promoting",
            PendingStatus::Rejecting => "rejecting",
        }
    }
}

/// Stored in the `pendingusers` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRegistration {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    pub organization: String,
    pub access_level: AccessLevel,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub registration_date: DateTime<Utc>,
    pub status: PendingStatus,
}

impl PendingRegistration {
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
        organization: String,
        access_level: AccessLevel,
        registration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email,
            password_hash,
            organization,
            access_level,
            registration_date,
            status: PendingStatus::Pending,
        }
    }
}
