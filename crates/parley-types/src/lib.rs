//! Shared domain types for Parley.
//!
//! Users, conversations, messages, the provider-facing LLM types, error
//! enums, and configuration structs.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod id;
pub mod llm;
pub mod message;
pub mod user;
