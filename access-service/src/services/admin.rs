//! Admin decisions on pending registrations and account activation.
//!
//! Approve and reject move a record between collections without a
//! transaction. The pending record is first claimed by a status
//! compare-and-swap so that concurrent decisions on the same id cannot both
//! proceed. A failed copy releases the claim. A failed delete after a
//! successful copy is logged and left for manual cleanup.

use std::sync::Arc;

use super::clock::Clock;
use super::error::ServiceError;
use super::metrics;
use super::store::CredentialStore;
use crate::models::{PendingRegistration, PendingStatus, RejectedRegistration, User};

const PENDING_NOT_FOUND: &str = "Pending user not found";

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    pub fn new(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Promote a pending registration to an active account.
    pub async fn approve(&self, pending_id: &str) -> Result<User, ServiceError> {
        let pending = self.claim(pending_id, PendingStatus::Promoting).await?;
        let user = User::from_approved(&pending, self.clock.now());

        if let Err(e) = self.store.insert_user(&user).await {
            tracing::error!(pending_id = %pending.id, error = %e, "Failed to create account from registration");
            self.release(&pending.id, PendingStatus::Promoting).await;
            return Err(e);
        }

        self.remove_pending(&pending, "approve").await;
        metrics::record_decision("approve");
        tracing::info!(pending_id = %pending.id, user_id = %user.id, "Registration approved");

        Ok(user)
    }

    /// Move a pending registration to the rejected audit log.
    pub async fn reject(
        &self,
        pending_id: &str,
        reason: Option<String>,
    ) -> Result<RejectedRegistration, ServiceError> {
        let pending = self.claim(pending_id, PendingStatus::Rejecting).await?;
        let rejected = RejectedRegistration::from_pending(&pending, reason, self.clock.now());

        if let Err(e) = self.store.insert_rejected(&rejected).await {
            tracing::error!(pending_id = %pending.id, error = %e, "Failed to record rejected registration");
            self.release(&pending.id, PendingStatus::Rejecting).await;
            return Err(e);
        }

        self.remove_pending(&pending, "reject").await;
        metrics::record_decision("reject");
        tracing::info!(pending_id = %pending.id, reason = %rejected.reason, "Registration rejected");

        Ok(rejected)
    }

    /// Enable or disable login for an account.
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<(), ServiceError> {
        let user_id = user_id.trim();
        if !self.store.set_user_active(user_id, is_active).await? {
            return Err(ServiceError::NotFound("User not found".to_string()));
        }
        tracing::info!(user_id = %user_id, is_active, "Account activation changed");
        Ok(())
    }

    async fn claim(
        &self,
        pending_id: &str,
        to: PendingStatus,
    ) -> Result<PendingRegistration, ServiceError> {
        let pending_id = pending_id.trim();
        if pending_id.is_empty() {
            return Err(ServiceError::Validation("User ID is required".to_string()));
        }

        match self
            .store
            .transition_pending(pending_id, PendingStatus::Pending, to)
            .await?
        {
            Some(pending) => Ok(pending),
            None => match self.store.find_pending_by_id(pending_id).await? {
                Some(existing) => {
                    tracing::warn!(
                        pending_id = %pending_id,
                        status = existing.status.as_str(),
                        "Registration already claimed by another decision"
                    );
                    Err(ServiceError::TransitionInProgress)
                }
                None => Err(ServiceError::NotFound(PENDING_NOT_FOUND.to_string())),
            },
        }
    }

    async fn release(&self, pending_id: &str, from: PendingStatus) {
        match self
            .store
            .transition_pending(pending_id, from, PendingStatus::Pending)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => tracing::error!(pending_id = %pending_id, "Claim vanished before it could be released"),
            Err(e) => tracing::error!(pending_id = %pending_id, error = %e, "Failed to release registration claim"),
        }
    }

    async fn remove_pending(&self, pending: &PendingRegistration, decision: &str) {
        match self.store.delete_pending(&pending.id).await {
            Ok(true) => {}
            Ok(false) => tracing::error!(
                pending_id = %pending.id,
                decision,
                "Pending registration disappeared before it could be removed"
            ),
            Err(e) => tracing::error!(
                pending_id = %pending.id,
                email = %pending.email,
                decision,
                error = %e,
                "Registration copied but pending record not removed; manual cleanup required"
            ),
        }
    }
}
