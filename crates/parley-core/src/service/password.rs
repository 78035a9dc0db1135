//! PasswordHasher trait for credential storage.
//!
//! The argon2 adapter lives in parley-infra.

/// Abstraction over one-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string.
    fn hash(&self, password: &str) -> Result<String, String>;

    /// Check a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}
