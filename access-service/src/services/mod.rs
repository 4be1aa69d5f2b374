//! Services layer for access-service.
//!
//! Workflows for registration, admin decisions, login and listings, plus the
//! credential store, token, cache and clock they are built on.

pub mod admin;
pub mod auth;
pub mod cache;
pub mod clock;
mod database;
pub mod error;
pub mod jwt;
pub mod listing;
mod memory;
pub mod metrics;
pub mod policy;
pub mod registration;
pub mod store;

pub use admin::AdminService;
pub use auth::{AuthService, LoginOutcome};
pub use cache::{CacheKey, ListingCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use database::MongoDb;
pub use error::ServiceError;
pub use jwt::{JwtService, SessionClaims, SessionIdentity, TokenError};
pub use listing::{ListingService, PendingListingCache, SearchStatus};
pub use memory::InMemoryStore;
pub use policy::PolicyService;
pub use registration::RegistrationService;
pub use store::{AccountFilter, CredentialStore};
