//! Ownership guard applied to every conversation and message operation.

use parley_types::error::{ChatError, Resource};
use parley_types::id::UserId;

/// Allow the call only when `caller` owns the resource.
///
/// Pure comparison. An unresolved owner (`None`) is always refused.
pub fn authorize(
    caller: &UserId,
    owner: Option<&UserId>,
    resource: Resource,
) -> Result<(), ChatError> {
    match owner {
        Some(owner) if owner == caller => Ok(()),
        _ => Err(ChatError::Forbidden(resource)),
    }
}
