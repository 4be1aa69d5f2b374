use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccessLevel, PendingRegistration};

pub const REJECTED_STATUS: &str = "rejected";
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

/// Append-only audit record stored in `rejectedusers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRegistration {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub access_level: AccessLevel,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub registration_date: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub rejection_date: DateTime<Utc>,
    pub status: String,
    pub reason: String,
}

impl RejectedRegistration {
    pub fn from_pending(
        pending: &PendingRegistration,
        reason: Option<String>,
        rejected_at: DateTime<Utc>,
    ) -> Self {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());

        Self {
            id: Uuid::new_v4().to_string(),
            first_name: pending.first_name.clone(),
            last_name: pending.last_name.clone(),
            email: pending.email.clone(),
            organization: pending.organization.clone(),
            access_level: pending.access_level,
            registration_date: pending.registration_date,
            rejection_date: rejected_at,
            status: REJECTED_STATUS.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingRegistration {
        PendingRegistration::new(
            "Ada".to_string(),
            "Byron".to_string(),
            "ada@corp.com".to_string(),
            "$2b$10$hash".to_string(),
            "Corp".to_string(),
            AccessLevel::Inspection,
            Utc::now(),
        )
    }

    #[test]
    fn test_reason_defaults_when_missing_or_blank() {
        let now = Utc::now();
        let missing = RejectedRegistration::from_pending(&pending(), None, now);
        let blank = RejectedRegistration::from_pending(&pending(), Some("  ".to_string()), now);

        assert_eq!(missing.reason, DEFAULT_REJECTION_REASON);
        assert_eq!(blank.reason, DEFAULT_REJECTION_REASON);
        assert_eq!(missing.status, REJECTED_STATUS);
    }

    #[test]
    fn test_reason_is_kept() {
        let record = RejectedRegistration::from_pending(
            &pending(),
            Some("Unknown organization".to_string()),
            Utc::now(),
        );
        assert_eq!(record.reason, "Unknown organization");
    }
}
