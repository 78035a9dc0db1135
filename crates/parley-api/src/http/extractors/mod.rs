//! Request extractors: bearer authentication and envelope-aware JSON bodies.

pub mod auth;
pub mod json;
