//! Business logic services (use cases).
//!
//! Services enforce ownership and visibility rules on top of the repository
//! traits. They depend on traits (ports) -- never on concrete
//! infrastructure implementations.

pub mod conversation;
pub mod message;
pub mod password;
pub mod user;
