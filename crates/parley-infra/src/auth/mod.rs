//! Bearer token issuance and verification.

pub mod jwt;
