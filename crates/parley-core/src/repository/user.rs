//! UserRepository trait definition.

use parley_types::error::RepositoryError;
use parley_types::id::UserId;
use parley_types::user::User;

/// Repository trait for user accounts.
///
/// `create` and `update` return `RepositoryError::Conflict` when the
/// username or email is already taken by another account.
pub trait UserRepository: Send + Sync {
    fn create(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn get(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Look up a user by (already normalized) email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn update(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a user and, by cascade, everything it owns.
    fn delete(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
