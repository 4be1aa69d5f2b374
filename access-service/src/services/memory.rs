//! In-process credential store used by tests and local runs without MongoDB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::error::ServiceError;
use super::store::{matches_query, AccountFilter, CredentialStore};
use crate::models::{status_for, PendingRegistration, PendingStatus, RejectedRegistration, User};

#[derive(Default)]
struct Collections {
    pending: HashMap<String, PendingRegistration>,
    users: HashMap<String, User>,
    rejected: Vec<RejectedRegistration>,
    sessions: HashMap<String, DateTime<Utc>>,
}

#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<Collections>,
    fail_user_inserts: AtomicBool,
    fail_pending_deletes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, ServiceError> {
        self.collections
            .lock()
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("In-memory store mutex poisoned: {}", e)))
    }

    /// Make subsequent `insert_user` calls fail.
    pub fn fail_user_inserts(&self, fail: bool) {
        self.fail_user_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `delete_pending` calls fail.
    pub fn fail_pending_deletes(&self, fail: bool) {
        self.fail_pending_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn rejected(&self) -> Result<Vec<RejectedRegistration>, ServiceError> {
        Ok(self.lock()?.rejected.clone())
    }

    /// Insert an account directly, bypassing the approval workflow.
    pub fn seed_user(&self, user: User) -> Result<(), ServiceError> {
        self.lock()?.users.insert(user.id.clone(), user);
        Ok(())
    }
}

fn pending_fields(p: &PendingRegistration) -> [&str; 4] {
    [
        p.first_name.as_str(),
        p.last_name.as_str(),
        p.email.as_str(),
        p.organization.as_str(),
    ]
}

fn user_fields(u: &User) -> [&str; 4] {
    [
        u.first_name.as_str(),
        u.last_name.as_str(),
        u.email.as_str(),
        u.organization.as_str(),
    ]
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), ServiceError> {
        self.lock().map(|_| ())
    }

    async fn insert_pending(&self, pending: &PendingRegistration) -> Result<(), ServiceError> {
        let mut c = self.lock()?;
        if c.pending.values().any(|p| p.email == pending.email) {
            return Err(ServiceError::DuplicateRegistration(
                "Registration request already pending for this email".to_string(),
            ));
        }
        c.pending.insert(pending.id.clone(), pending.clone());
        Ok(())
    }

    async fn find_pending_by_id(&self, id: &str) -> Result<Option<PendingRegistration>, ServiceError> {
        Ok(self.lock()?.pending.get(id).cloned())
    }

    async fn find_pending_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PendingRegistration>, ServiceError> {
        Ok(self
            .lock()?
            .pending
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn transition_pending(
        &self,
        id: &str,
        from: PendingStatus,
        to: PendingStatus,
    ) -> Result<Option<PendingRegistration>, ServiceError> {
        let mut c = self.lock()?;
        match c.pending.get_mut(id) {
            Some(p) if p.status == from => {
                p.status = to;
                Ok(Some(p.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_pending(&self, id: &str) -> Result<bool, ServiceError> {
        if self.fail_pending_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Injected delete_pending failure"
            )));
        }
        Ok(self.lock()?.pending.remove(id).is_some())
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<PendingRegistration>, ServiceError> {
        let c = self.lock()?;
        let mut pending: Vec<_> = c
            .pending
            .values()
            .filter(|p| p.status == PendingStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.registration_date.cmp(&a.registration_date));
        pending.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(pending)
    }

    async fn search_pending(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<PendingRegistration>, ServiceError> {
        let c = self.lock()?;
        let mut pending: Vec<_> = c
            .pending
            .values()
            .filter(|p| query.map_or(true, |q| matches_query(q, &pending_fields(p))))
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.registration_date.cmp(&a.registration_date));
        Ok(pending)
    }

    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        if self.fail_user_inserts.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Injected insert_user failure"
            )));
        }
        let mut c = self.lock()?;
        if c.users.values().any(|u| u.email == user.email) {
            return Err(ServiceError::DuplicateRegistration(
                "An account already exists for this email".to_string(),
            ));
        }
        c.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn record_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), ServiceError> {
        if let Some(user) = self.lock()?.users.get_mut(id) {
            user.last_login = Some(at);
        }
        Ok(())
    }

    async fn set_user_active(&self, id: &str, is_active: bool) -> Result<bool, ServiceError> {
        match self.lock()?.users.get_mut(id) {
            Some(user) => {
                user.is_active = is_active;
                user.status = status_for(is_active).to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let mut users: Vec<_> = self.lock()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn find_active_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, ServiceError> {
        let c = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| c.users.get(id))
            .filter(|u| u.is_active)
            .cloned()
            .collect())
    }

    async fn search_users(
        &self,
        query: Option<&str>,
        filter: AccountFilter,
    ) -> Result<Vec<User>, ServiceError> {
        let c = self.lock()?;
        let mut users: Vec<_> = c
            .users
            .values()
            .filter(|u| match filter {
                AccountFilter::Any => true,
                AccountFilter::Active => u.is_active,
                AccountFilter::Inactive => !u.is_active,
            })
            .filter(|u| query.map_or(true, |q| matches_query(q, &user_fields(u))))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn count_active_users(&self) -> Result<u64, ServiceError> {
        Ok(self.lock()?.users.values().filter(|u| u.is_active).count() as u64)
    }

    async fn count_active_users_by_access_level(
        &self,
    ) -> Result<BTreeMap<String, u64>, ServiceError> {
        let c = self.lock()?;
        let mut counts = BTreeMap::new();
        for user in c.users.values().filter(|u| u.is_active) {
            *counts.entry(user.access_level.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn insert_rejected(&self, rejected: &RejectedRegistration) -> Result<(), ServiceError> {
        self.lock()?.rejected.push(rejected.clone());
        Ok(())
    }

    async fn touch_session(&self, user_id: &str, at: DateTime<Utc>) -> Result<(), ServiceError> {
        self.lock()?.sessions.insert(user_id.to_string(), at);
        Ok(())
    }

    async fn active_session_user_ids(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, ServiceError> {
        let c = self.lock()?;
        let mut ids: Vec<_> = c
            .sessions
            .iter()
            .filter(|(_, last_active)| **last_active >= since)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessLevel;

    fn pending(email: &str) -> PendingRegistration {
        PendingRegistration::new(
            "Ada".to_string(),
            "Byron".to_string(),
            email.to_string(),
            "hash".to_string(),
            "Corp".to_string(),
            AccessLevel::Inspection,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_pending_email_rejected() {
        let store = InMemoryStore::new();
        store.insert_pending(&pending("a@corp.com")).await.unwrap();

        let err = store.insert_pending(&pending("a@corp.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateRegistration(_)));
        assert_eq!(store.list_pending(50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_swap() {
        let store = InMemoryStore::new();
        let record = pending("a@corp.com");
        store.insert_pending(&record).await.unwrap();

        let claimed = store
            .transition_pending(&record.id, PendingStatus::Pending, PendingStatus::Promoting)
            .await
            .unwrap();
        assert_eq!(claimed.unwrap().status, PendingStatus::Promoting);

        let second = store
            .transition_pending(&record.id, PendingStatus::Pending, PendingStatus::Rejecting)
            .await
            .unwrap();
        assert!(second.is_none());

        // Claimed records drop out of the pending listing.
        assert!(store.list_pending(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_pending_is_newest_first_and_capped() {
        let store = InMemoryStore::new();
        let base = Utc::now();
        for i in 0..5 {
            let mut record = pending(&format!("user{}@corp.com", i));
            record.registration_date = base + chrono::Duration::seconds(i);
            store.insert_pending(&record).await.unwrap();
        }

        let listed = store.list_pending(3).await.unwrap();
        let emails: Vec<_> = listed.iter().map(|p| p.email.as_str()).collect();
        assert_eq!(emails, ["user4@corp.com", "user3@corp.com", "user2@corp.com"]);
    }

    #[tokio::test]
    async fn test_active_sessions_since() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store
            .touch_session("old", now - chrono::Duration::minutes(20))
            .await
            .unwrap();
        store.touch_session("fresh", now).await.unwrap();

        let ids = store
            .active_session_user_ids(now - chrono::Duration::minutes(15))
            .await
            .unwrap();
        assert_eq!(ids, vec!["fresh".to_string()]);
    }
}
