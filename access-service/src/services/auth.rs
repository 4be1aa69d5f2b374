use std::sync::Arc;

use super::clock::Clock;
use super::error::ServiceError;
use super::jwt::{IssuedToken, JwtService, SessionIdentity};
use super::metrics;
use super::store::CredentialStore;
use crate::dtos::auth::LoginRequest;
use crate::models::{PendingStatus, User};
use crate::utils::{Password, PasswordHashString, PasswordHasher};

/// A successful login: the account as persisted plus its session token.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    jwt: JwtService,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        jwt: JwtService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher,
            jwt,
            clock,
        }
    }

    /// Authenticate an active account and issue its session token.
    ///
    /// Inactive accounts are refused before the password is looked at.
    /// Emails that only exist as pending registrations get a distinct error;
    /// rejected registrations are never consulted.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome, ServiceError> {
        let email = req.email.trim().to_lowercase();
        if email.is_empty() || req.password.is_empty() {
            return Err(ServiceError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        if let Some(mut user) = self.store.find_user_by_email(&email).await? {
            if !user.is_active {
                metrics::record_login("inactive");
                tracing::info!(user_id = %user.id, "Login refused for inactive account");
                return Err(ServiceError::AccountInactive);
            }

            let matches = self
                .hasher
                .verify(
                    Password::new(req.password),
                    PasswordHashString::new(user.password_hash.clone()),
                )
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(user_id = %user.id, error = %e, "Stored password hash could not be verified");
                    false
                });

            if !matches {
                metrics::record_login("invalid_credentials");
                return Err(ServiceError::InvalidCredentials);
            }

            let now = self.clock.now();
            self.store.record_login(&user.id, now).await?;
            self.store.touch_session(&user.id, now).await?;
            user.last_login = Some(now);

            let token = self.jwt.issue(&user)?;
            metrics::record_login("success");
            tracing::info!(user_id = %user.id, "User logged in");

            return Ok(LoginOutcome { user, token });
        }

        // Records mid-rejection (or left claimed by a failed delete) no
        // longer count as awaiting approval.
        let awaiting = self
            .store
            .find_pending_by_email(&email)
            .await?
            .is_some_and(|p| p.status == PendingStatus::Pending);
        if awaiting {
            metrics::record_login("pending");
            return Err(ServiceError::PendingApproval);
        }

        metrics::record_login("invalid_credentials");
        Err(ServiceError::InvalidCredentials)
    }

    /// Resolve the account behind a verified session. Read-only.
    pub async fn current_user(&self, identity: &SessionIdentity) -> Result<User, ServiceError> {
        let user = self
            .store
            .find_user_by_id(&identity.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        if !user.is_active {
            return Err(ServiceError::AccountInactive);
        }

        Ok(user)
    }

    /// Refresh the presence record for the session's user.
    pub async fn heartbeat(&self, identity: &SessionIdentity) -> Result<(), ServiceError> {
        self.store
            .touch_session(&identity.user_id, self.clock.now())
            .await
    }
}
