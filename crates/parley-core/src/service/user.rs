//! Account registration, login, and self-service profile management.

use std::sync::LazyLock;

use chrono::Utc;
use parley_types::error::{AuthError, UserError, ValidationError};
use parley_types::id::UserId;
use parley_types::user::{
    MAX_USERNAME_CHARS, MIN_PASSWORD_CHARS, MIN_USERNAME_CHARS, NewUser, User, UserUpdate,
    default_avatar,
};
use regex::Regex;
use tracing::info;

use crate::auth::token::TokenService;
use crate::repository::user::UserRepository;
use crate::service::password::PasswordHasher;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// A user together with a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub struct UserService<U: UserRepository, H: PasswordHasher, T: TokenService> {
    repo: U,
    hasher: H,
    tokens: T,
}

impl<U: UserRepository, H: PasswordHasher, T: TokenService> UserService<U, H, T> {
    pub fn new(repo: U, hasher: H, tokens: T) -> Self {
        Self {
            repo,
            hasher,
            tokens,
        }
    }

    pub async fn register(&self, input: NewUser) -> Result<Session, UserError> {
        let username = validate_username(&input.username)?;
        let email = normalize_email(&input.email)?;
        validate_password(&input.password)?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            avatar: default_avatar(&username),
            username,
            email,
            password_hash: self.hash(&input.password)?,
            created_at: now,
            updated_at: now,
        };
        let user = self.repo.create(&user).await?;
        info!(user_id = %user.id, "User registered");

        let token = self.tokens.issue(&user.id)?;
        Ok(Session { user, token })
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, UserError> {
        let email = email.trim().to_lowercase();
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .filter(|u| self.hasher.verify(password, &u.password_hash))
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self.tokens.issue(&user.id)?;
        Ok(Session { user, token })
    }

    /// Resolve a bearer token to a user that still exists.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.tokens.authenticate(token)?;
        match self.repo.get(&user_id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthError::UserNotFound),
            Err(e) => {
                tracing::error!(error = %e, "User lookup failed during authentication");
                Err(AuthError::UserNotFound)
            }
        }
    }

    pub async fn get_profile(&self, caller: &UserId, id: &UserId) -> Result<User, UserError> {
        ensure_self(caller, id)?;
        self.repo.get(id).await?.ok_or(UserError::NotFound)
    }

    pub async fn update_profile(
        &self,
        caller: &UserId,
        id: &UserId,
        update: UserUpdate,
    ) -> Result<User, UserError> {
        ensure_self(caller, id)?;
        let mut user = self.repo.get(id).await?.ok_or(UserError::NotFound)?;

        if let Some(username) = update.username {
            user.username = validate_username(&username)?;
        }
        if let Some(email) = update.email {
            user.email = normalize_email(&email)?;
        }
        if let Some(avatar) = update.avatar {
            let avatar = avatar.trim();
            user.avatar = if avatar.is_empty() {
                default_avatar(&user.username)
            } else {
                avatar.to_string()
            };
        }
        if let Some(password) = update.password {
            validate_password(&password)?;
            user.password_hash = self.hash(&password)?;
        }
        user.updated_at = Utc::now();

        self.repo.update(&user).await?;
        info!(user_id = %id, "User profile updated");
        Ok(user)
    }

    pub async fn delete_account(&self, caller: &UserId, id: &UserId) -> Result<(), UserError> {
        ensure_self(caller, id)?;
        self.repo.delete(id).await?;
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    fn hash(&self, password: &str) -> Result<String, UserError> {
        self.hasher.hash(password).map_err(UserError::Hashing)
    }
}

fn ensure_self(caller: &UserId, id: &UserId) -> Result<(), UserError> {
    if caller == id {
        Ok(())
    } else {
        Err(UserError::Forbidden)
    }
}

pub fn validate_username(raw: &str) -> Result<String, ValidationError> {
    let username = raw.trim();
    let len = username.chars().count();
    if len < MIN_USERNAME_CHARS {
        return Err(ValidationError::new(
            "username",
            format!("username must be at least {MIN_USERNAME_CHARS} characters"),
        ));
    }
    if len > MAX_USERNAME_CHARS {
        return Err(ValidationError::new(
            "username",
            format!("username cannot be more than {MAX_USERNAME_CHARS} characters"),
        ));
    }
    Ok(username.to_string())
}

pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::new("email", "please provide a valid email"));
    }
    Ok(email)
}

pub fn validate_password(raw: &str) -> Result<(), ValidationError> {
    if raw.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::new(
            "password",
            format!("password must be at least {MIN_PASSWORD_CHARS} characters"),
        ));
    }
    Ok(())
}
