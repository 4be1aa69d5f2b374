//! Signup into the pending-registration store.

use std::sync::Arc;
use validator::Validate;

use super::clock::Clock;
use super::error::ServiceError;
use super::metrics;
use super::policy::PolicyService;
use super::store::CredentialStore;
use crate::dtos::auth::SignupRequest;
use crate::models::{AccessLevel, PendingRegistration};
use crate::utils::validation::first_validation_message;
use crate::utils::{Password, PasswordHasher};

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher, clock: Arc<dyn Clock>) -> Self {
        Self { store, hasher, clock }
    }

    /// Validate and store a pending registration.
    ///
    /// Order of checks: personal email domain, required fields, email format,
    /// access level, password strength, then duplicates in the pending and
    /// active sets.
    pub async fn register(&self, req: SignupRequest) -> Result<PendingRegistration, ServiceError> {
        let email = req.email.trim().to_lowercase();

        if email.contains('@') && PolicyService::is_personal_email(&email) {
            tracing::info!(domain = ?PolicyService::email_domain(&email), "Signup rejected by email domain policy");
            return Err(ServiceError::Policy);
        }

        let required = [
            &req.email,
            &req.password,
            &req.first_name,
            &req.last_name,
            &req.organization,
            &req.access_level,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(ServiceError::Validation("All fields are required".to_string()));
        }

        let normalized = SignupRequest {
            email: email.clone(),
            ..req
        };
        normalized
            .validate()
            .map_err(|e| ServiceError::Validation(first_validation_message(&e)))?;

        let access_level: AccessLevel = normalized
            .access_level
            .parse()
            .map_err(|_| ServiceError::Validation("Invalid access level".to_string()))?;

        PolicyService::validate_password(&normalized.password)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        if self.store.find_pending_by_email(&email).await?.is_some() {
            return Err(ServiceError::DuplicateRegistration(
                "Registration request already pending for this email".to_string(),
            ));
        }
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::DuplicateRegistration(
                "An account already exists for this email".to_string(),
            ));
        }

        let password_hash = self
            .hasher
            .hash(Password::new(normalized.password))
            .await?;

        let pending = PendingRegistration::new(
            normalized.first_name.trim().to_string(),
            normalized.last_name.trim().to_string(),
            email,
            password_hash.into_string(),
            normalized.organization.trim().to_string(),
            access_level,
            self.clock.now(),
        );

        self.store.insert_pending(&pending).await?;
        metrics::record_registration();

        tracing::info!(
            pending_id = %pending.id,
            access_level = %pending.access_level,
            "Registration stored pending approval"
        );

        Ok(pending)
    }
}
