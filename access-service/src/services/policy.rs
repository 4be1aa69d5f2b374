//! Registration and access policies.
//!
//! Organization-email rule, password strength, and the flat admin-role check
//! used by the session gate.

use super::jwt::SessionIdentity;

/// Consumer mail providers that cannot be used to register.
pub const PERSONAL_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "mail.com",
    "icloud.com",
    "protonmail.com",
    "zoho.com",
    "yandex.com",
    "live.com",
    "inbox.com",
    "gmx.com",
];

pub const PASSWORD_MIN_LENGTH: usize = 8;
const PASSWORD_SPECIAL_CHARS: &[char] = &['!', '@', '#', '$', '%', '^', '&', '*'];

/// Errors related to registration policy validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Password is too short.
    PasswordTooShort { min_length: usize, actual_length: usize },
    /// Password missing uppercase letter.
    PasswordMissingUppercase,
    /// Password missing lowercase letter.
    PasswordMissingLowercase,
    /// Password missing number.
    PasswordMissingNumber,
    /// Password missing special character.
    PasswordMissingSpecial,
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::PasswordTooShort {
                min_length,
                actual_length,
            } => write!(
                f,
                "Password must be at least {} characters (got {})",
                min_length, actual_length
            ),
            PolicyError::PasswordMissingUppercase => {
                write!(f, "Password must contain at least one uppercase letter")
            }
            PolicyError::PasswordMissingLowercase => {
                write!(f, "Password must contain at least one lowercase letter")
            }
            PolicyError::PasswordMissingNumber => {
                write!(f, "Password must contain at least one number")
            }
            PolicyError::PasswordMissingSpecial => write!(
                f,
                "Password must contain at least one special character (!@#$%^&*)"
            ),
        }
    }
}

impl std::error::Error for PolicyError {}

#[derive(Debug, Clone)]
pub struct PolicyService;

impl PolicyService {
    /// Validate a password against the registration policy.
    ///
    /// Returns the first violation found.
    pub fn validate_password(password: &str) -> Result<(), PolicyError> {
        let length = password.chars().count();
        if length < PASSWORD_MIN_LENGTH {
            return Err(PolicyError::PasswordTooShort {
                min_length: PASSWORD_MIN_LENGTH,
                actual_length: length,
            });
        }

        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PolicyError::PasswordMissingUppercase);
        }

        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(PolicyError::PasswordMissingLowercase);
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PolicyError::PasswordMissingNumber);
        }

        if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(&c)) {
            return Err(PolicyError::PasswordMissingSpecial);
        }

        Ok(())
    }

    /// Lower-cased part after the last `@`, if any.
    pub fn email_domain(email: &str) -> Option<String> {
        email
            .trim()
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_lowercase())
    }

    /// Exact, case-insensitive match against [`PERSONAL_EMAIL_DOMAINS`].
    /// Subdomains such as `mail.gmail.com` are not matched.
    pub fn is_personal_email(email: &str) -> bool {
        Self::email_domain(email)
            .map(|domain| PERSONAL_EMAIL_DOMAINS.contains(&domain.as_str()))
            .unwrap_or(false)
    }

    pub fn has_admin_access(identity: &SessionIdentity) -> bool {
        identity.is_admin || identity.is_super_admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessLevel;

    #[test]
    fn test_password_too_short() {
        let result = PolicyService::validate_password("Aa1!aaa");
        assert!(matches!(result, Err(PolicyError::PasswordTooShort { .. })));
    }

    #[test]
    fn test_password_missing_classes() {
        assert_eq!(
            PolicyService::validate_password("aa1!aaaa"),
            Err(PolicyError::PasswordMissingUppercase)
        );
        assert_eq!(
            PolicyService::validate_password("AA1!AAAA"),
            Err(PolicyError::PasswordMissingLowercase)
        );
        assert_eq!(
            PolicyService::validate_password("Aab!aaaa"),
            Err(PolicyError::PasswordMissingNumber)
        );
        assert_eq!(
            PolicyService::validate_password("Aa1-aaaa"),
            Err(PolicyError::PasswordMissingSpecial)
        );
    }

    #[test]
    fn test_password_valid() {
        assert!(PolicyService::validate_password("Aa1!aaaa").is_ok());
    }

    #[test]
    fn test_personal_domains_are_case_insensitive() {
        assert!(PolicyService::is_personal_email("x@gmail.com"));
        assert!(PolicyService::is_personal_email("x@GMAIL.COM"));
        assert!(PolicyService::is_personal_email("x@Proton@ProtonMail.com"));
        assert!(!PolicyService::is_personal_email("x@corp.com"));
        assert!(!PolicyService::is_personal_email("x@mail.gmail.com"));
        assert!(!PolicyService::is_personal_email("no-at-sign"));
    }

    #[test]
    fn test_admin_access() {
        let mut identity = SessionIdentity {
            user_id: "u1".to_string(),
            email: "a@corp.com".to_string(),
            access_level: AccessLevel::Inspection,
            is_admin: false,
            is_super_admin: false,
        };
        assert!(!PolicyService::has_admin_access(&identity));

        identity.is_super_admin = true;
        assert!(PolicyService::has_admin_access(&identity));

        identity.is_super_admin = false;
        identity.is_admin = true;
        assert!(PolicyService::has_admin_access(&identity));
    }
}
