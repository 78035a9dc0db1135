//! REST API handlers grouped by resource.

pub mod conversation;
pub mod message;
pub mod user;

use std::str::FromStr;

use parley_types::error::Resource;

use crate::http::error::AppError;

/// Parse a path or query identifier, reporting malformed input as `INVALID_ID`.
pub(crate) fn parse_id<T: FromStr>(raw: &str, resource: Resource) -> Result<T, AppError> {
    raw.parse().map_err(|_| AppError::InvalidId(resource))
}
