//! TokenService trait for issuing and verifying bearer credentials.
//!
//! Defined in parley-core so services can mint tokens without coupling to a
//! signing scheme. The JWT adapter lives in parley-infra.

use parley_types::error::AuthError;
use parley_types::id::UserId;

/// Issues bearer tokens and resolves them back to a user identity.
pub trait TokenService: Send + Sync {
    /// Mint a token for `user_id`, expiring after the configured lifetime.
    fn issue(&self, user_id: &UserId) -> Result<String, AuthError>;

    /// Verify a token and return the user it was issued to.
    fn authenticate(&self, token: &str) -> Result<UserId, AuthError>;
}
