pub mod password;
pub mod shutdown;
pub mod validation;

pub use password::{hash_password, verify_password, Password, PasswordHashString, PasswordHasher};
pub use validation::{JsonBody, ValidatedJson};
