//! Business logic and repository trait definitions for Parley.
//!
//! This crate defines the "ports" (repository, provider, hashing, and token
//! traits) that the infrastructure layer implements. It depends only on
//! `parley-types` -- never on `parley-infra` or any database/IO crate.

pub mod auth;
pub mod chat;
pub mod llm;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
