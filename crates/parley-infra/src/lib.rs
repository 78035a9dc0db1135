//! Infrastructure layer for Parley.
//!
//! Contains implementations of the traits defined in `parley-core`: SQLite
//! repositories, the Gemini completion provider, argon2 password hashing,
//! JWT bearer tokens, and the configuration file loader.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod llm;
pub mod sqlite;
