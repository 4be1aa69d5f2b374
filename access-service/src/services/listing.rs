//! Read-side queries for the admin dashboard.

use chrono::Duration;
use std::sync::Arc;

use super::cache::{CacheKey, ListingCache};
use super::clock::Clock;
use super::error::ServiceError;
use super::metrics;
use super::store::{AccountFilter, CredentialStore};
use crate::dtos::admin::{PendingUserSummary, SearchHit, UserStats, UserSummary};

pub const PENDING_USERS_KEY: CacheKey<'static> = CacheKey::new("admin", "pending_users");

pub type PendingListingCache = ListingCache<Vec<PendingUserSummary>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    All,
    Pending,
    Active,
    Inactive,
}

impl std::str::FromStr for SearchStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(SearchStatus::All),
            "pending" => Ok(SearchStatus::Pending),
            "active" => Ok(SearchStatus::Active),
            "inactive" => Ok(SearchStatus::Inactive),
            _ => Err(ServiceError::Validation(format!(
                "Invalid status filter: {}. Expected one of all, pending, active, inactive",
                s
            ))),
        }
    }
}

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn CredentialStore>,
    cache: Arc<PendingListingCache>,
    clock: Arc<dyn Clock>,
    pending_limit: i64,
    active_window: Duration,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        cache: Arc<PendingListingCache>,
        clock: Arc<dyn Clock>,
        pending_limit: i64,
        active_window: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            pending_limit,
            active_window,
        }
    }

    /// Pending registrations, newest first. Served from the listing cache
    /// while fresh; the flag reports whether the cache answered.
    pub async fn pending_users(&self) -> Result<(Vec<PendingUserSummary>, bool), ServiceError> {
        if let Some(users) = self.cache.get(&PENDING_USERS_KEY) {
            metrics::record_cache("hit");
            return Ok((users, true));
        }
        metrics::record_cache("miss");

        let users: Vec<PendingUserSummary> = self
            .store
            .list_pending(self.pending_limit)
            .await?
            .iter()
            .map(PendingUserSummary::from)
            .collect();

        self.cache.set(&PENDING_USERS_KEY, users.clone());
        tracing::debug!(count = users.len(), "Pending listing refreshed");
        Ok((users, false))
    }

    pub async fn all_users(&self) -> Result<Vec<UserSummary>, ServiceError> {
        Ok(self
            .store
            .list_users()
            .await?
            .iter()
            .map(UserSummary::from)
            .collect())
    }

    /// Accounts with presence inside the active window.
    pub async fn active_users(&self) -> Result<Vec<UserSummary>, ServiceError> {
        let ids = self.active_session_ids().await?;
        Ok(self
            .store
            .find_active_users_by_ids(&ids)
            .await?
            .iter()
            .map(UserSummary::from)
            .collect())
    }

    pub async fn search(
        &self,
        query: Option<&str>,
        status: SearchStatus,
    ) -> Result<Vec<SearchHit>, ServiceError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let mut hits = Vec::new();
        if matches!(status, SearchStatus::All | SearchStatus::Pending) {
            hits.extend(
                self.store
                    .search_pending(query)
                    .await?
                    .iter()
                    .map(SearchHit::from),
            );
        }

        let accounts = match status {
            SearchStatus::All => Some(AccountFilter::Any),
            SearchStatus::Active => Some(AccountFilter::Active),
            SearchStatus::Inactive => Some(AccountFilter::Inactive),
            SearchStatus::Pending => None,
        };
        if let Some(filter) = accounts {
            hits.extend(
                self.store
                    .search_users(query, filter)
                    .await?
                    .iter()
                    .map(SearchHit::from),
            );
        }

        Ok(hits)
    }

    pub async fn stats(&self) -> Result<UserStats, ServiceError> {
        let total_users = self.store.count_active_users().await?;
        let active_users = self.active_session_ids().await?.len() as u64;
        let users_by_access_level = self.store.count_active_users_by_access_level().await?;

        Ok(UserStats {
            total_users,
            active_users,
            users_by_access_level,
        })
    }

    async fn active_session_ids(&self) -> Result<Vec<String>, ServiceError> {
        let since = self.clock.now() - self.active_window;
        self.store.active_session_user_ids(since).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_status_parse() {
        assert_eq!("".parse::<SearchStatus>().unwrap(), SearchStatus::All);
        assert_eq!("ALL".parse::<SearchStatus>().unwrap(), SearchStatus::All);
        assert_eq!("pending".parse::<SearchStatus>().unwrap(), SearchStatus::Pending);
        assert_eq!("Inactive".parse::<SearchStatus>().unwrap(), SearchStatus::Inactive);
        assert!(matches!(
            "rejected".parse::<SearchStatus>(),
            Err(ServiceError::Validation(_))
        ));
    }
}
