//! Persistence seam for registrations, accounts and presence records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::error::ServiceError;
use crate::models::{PendingRegistration, PendingStatus, RejectedRegistration, User};

/// Which accounts a user search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFilter {
    Any,
    Active,
    Inactive,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn health_check(&self) -> Result<(), ServiceError>;

    /// Fails with `DuplicateRegistration` when the email is already pending.
    async fn insert_pending(&self, pending: &PendingRegistration) -> Result<(), ServiceError>;
    async fn find_pending_by_id(&self, id: &str) -> Result<Option<PendingRegistration>, ServiceError>;
    async fn find_pending_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PendingRegistration>, ServiceError>;
    /// Compare-and-swap on `status`. Returns the updated record, or `None`
    /// when no record with that id is currently in `from`.
    async fn transition_pending(
        &self,
        id: &str,
        from: PendingStatus,
        to: PendingStatus,
    ) -> Result<Option<PendingRegistration>, ServiceError>;
    async fn delete_pending(&self, id: &str) -> Result<bool, ServiceError>;
    /// Records in `pending` status, newest registration first.
    async fn list_pending(&self, limit: i64) -> Result<Vec<PendingRegistration>, ServiceError>;
    /// Case-insensitive literal substring match over names, email and
    /// organization. `None` matches everything.
    async fn search_pending(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<PendingRegistration>, ServiceError>;

    /// Fails with `DuplicateRegistration` when the email already has an account.
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ServiceError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;
    async fn record_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), ServiceError>;
    async fn set_user_active(&self, id: &str, is_active: bool) -> Result<bool, ServiceError>;
    async fn list_users(&self) -> Result<Vec<User>, ServiceError>;
    /// Active accounts (`isActive=true`) among `ids`.
    async fn find_active_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, ServiceError>;
    async fn search_users(
        &self,
        query: Option<&str>,
        filter: AccountFilter,
    ) -> Result<Vec<User>, ServiceError>;
    async fn count_active_users(&self) -> Result<u64, ServiceError>;
    /// Active accounts grouped by access level.
    async fn count_active_users_by_access_level(
        &self,
    ) -> Result<BTreeMap<String, u64>, ServiceError>;

    async fn insert_rejected(&self, rejected: &RejectedRegistration) -> Result<(), ServiceError>;

    /// Upsert the presence record for `user_id`.
    async fn touch_session(&self, user_id: &str, at: DateTime<Utc>) -> Result<(), ServiceError>;
    /// User ids with presence at or after `since`.
    async fn active_session_user_ids(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, ServiceError>;
}

/// Lower-cased substring match used by stores without a query engine.
pub(crate) fn matches_query(query: &str, fields: &[&str]) -> bool {
    let needle = query.to_lowercase();
    fields.iter().any(|f| f.to_lowercase().contains(&needle))
}
