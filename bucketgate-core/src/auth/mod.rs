//! Authentication and access control
//!
//! Credentials are loaded once at startup, sessions live in an explicit
//! [`SessionStore`], and [`AccessGate`] decides per request whether the caller
//! reaches the protected routes.

pub mod authenticator;
pub mod credentials;
pub mod gate;
pub mod session;

pub use authenticator::SessionAuthenticator;
pub use credentials::CredentialStore;
pub use gate::{AccessGate, GateDecision, ResponseFormat};
pub use session::{Session, SessionExpiry, SessionStore};
