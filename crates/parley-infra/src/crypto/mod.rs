//! Cryptographic operations for Parley.
//!
//! - `password`: argon2id password hashing

pub mod password;
