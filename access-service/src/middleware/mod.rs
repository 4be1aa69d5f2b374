pub mod session;

pub use session::{session_gate_middleware, AuthenticatedUser, SessionGate, SESSION_COOKIE};
