//! Caller identity and ownership checks.

pub mod guard;
pub mod token;
