//! Approved platform accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccessLevel, PendingRegistration};

pub const ACTIVE_STATUS: &str = "active";
pub const INACTIVE_STATUS: &str = "inactive";

fn default_status() -> String {
    ACTIVE_STATUS.to_string()
}

fn default_true() -> bool {
    true
}

/// Stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", deserialize_with = "super::string_or_object_id::deserialize")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    pub organization: String,
    pub access_level: AccessLevel,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(
        default,
        with = "super::optional_chrono_datetime_as_bson_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "super::optional_chrono_datetime_as_bson_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub registration_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "super::optional_chrono_datetime_as_bson_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub approval_date: Option<DateTime<Utc>>,
}

/// `status` string stored alongside `isActive`.
pub fn status_for(is_active: bool) -> &'static str {
    if is_active {
        ACTIVE_STATUS
    } else {
        INACTIVE_STATUS
    }
}

impl User {
    /// Build the account created when a pending registration is approved.
    /// Approved accounts never carry admin flags.
    pub fn from_approved(pending: &PendingRegistration, approved_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name: pending.first_name.clone(),
            last_name: pending.last_name.clone(),
            email: pending.email.clone(),
            password_hash: pending.password_hash.clone(),
            organization: pending.organization.clone(),
            access_level: pending.access_level,
            is_admin: false,
            is_super_admin: false,
            is_active: true,
            status: default_status(),
            last_login: None,
            registration_date: Some(pending.registration_date),
            approval_date: Some(approved_at),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_approved_copies_profile_without_admin_flags() {
        let now = Utc::now();
        let pending = PendingRegistration::new(
            "Ada".to_string(),
            "Byron".to_string(),
            "ada@corp.com".to_string(),
            "$2b$10$hash".to_string(),
            "Corp".to_string(),
            AccessLevel::Maintenance,
            now,
        );

        let user = User::from_approved(&pending, now);

        assert_ne!(user.id, pending.id);
        assert_eq!(user.email, "ada@corp.com");
        assert_eq!(user.password_hash, pending.password_hash);
        assert_eq!(user.access_level, AccessLevel::Maintenance);
        assert!(user.is_active);
        assert!(!user.is_admin);
        assert!(!user.is_super_admin);
        assert_eq!(user.status, ACTIVE_STATUS);
        assert_eq!(user.registration_date, Some(now));
        assert_eq!(user.approval_date, Some(now));
    }

    #[test]
    fn test_seeded_account_with_object_id_deserializes() {
        use mongodb::bson::{doc, oid::ObjectId};

        let oid = ObjectId::new();
        let user: User = mongodb::bson::from_document(doc! {
            "_id": oid,
            "firstName": "Site",
            "lastName": "Admin",
            "email": "admin@corp.com",
            "password": "$2a$10$abcdefghijklmnopqrstuu",
            "organization": "Corp",
            "accessLevel": "leadership",
            "isAdmin": true,
            "isSuperAdmin": true,
        })
        .unwrap();

        assert_eq!(user.id, oid.to_hex());
        assert!(user.is_admin);
        assert!(user.is_active);
        assert_eq!(user.status, ACTIVE_STATUS);
        assert!(user.last_login.is_none());
    }

    #[test]
    fn test_string_id_deserializes() {
        use mongodb::bson::doc;

        let user: User = mongodb::bson::from_document(doc! {
            "_id": "7d3c1c52-1111-4a4b-9c55-0f6e5d8f2a10",
            "firstName": "Ada",
            "lastName": "Byron",
            "email": "ada@corp.com",
            "password": "$2b$10$hash",
            "organization": "Corp",
            "accessLevel": "inspection",
        })
        .unwrap();

        assert_eq!(user.id, "7d3c1c52-1111-4a4b-9c55-0f6e5d8f2a10");
    }

    #[test]
    fn test_numeric_id_rejected() {
        use mongodb::bson::doc;

        let result = mongodb::bson::from_document::<User>(doc! {
            "_id": 42,
            "firstName": "Ada",
            "lastName": "Byron",
            "email": "ada@corp.com",
            "password": "$2b$10$hash",
            "organization": "Corp",
            "accessLevel": "inspection",
        });

        assert!(result.is_err());
    }
}
