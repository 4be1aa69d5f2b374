use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Please use your organization email address. Personal email domains are not allowed.")]
    Policy,

    #[error("{0}")]
    DuplicateRegistration(String),

    #[error("{0}")]
    NotFound(String),

    #[error("This registration is already being processed")]
    TransitionInProgress,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Your account is pending approval. Please wait for admin confirmation.")]
    PendingApproval,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Database(e) => AppError::from(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Validation(_)
            | ServiceError::Policy
            | ServiceError::DuplicateRegistration(_) => AppError::BadRequest(anyhow::anyhow!(message)),
            ServiceError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(message)),
            ServiceError::TransitionInProgress => AppError::Conflict(anyhow::anyhow!(message)),
            ServiceError::InvalidCredentials => AppError::Unauthorized(anyhow::anyhow!(message)),
            ServiceError::AccountInactive | ServiceError::PendingApproval => {
                AppError::Forbidden(anyhow::anyhow!(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Policy, StatusCode::BAD_REQUEST),
            (ServiceError::DuplicateRegistration("dup".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ServiceError::TransitionInProgress, StatusCode::CONFLICT),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::AccountInactive, StatusCode::FORBIDDEN),
            (ServiceError::PendingApproval, StatusCode::FORBIDDEN),
            (
                ServiceError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }
}
