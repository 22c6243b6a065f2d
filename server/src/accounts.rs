//! User accounts: creation, credential checks, profile updates and tokens.

use larder_core::error::BLANK;
use larder_core::{normalize_email, validate_email, ProfileChanges, Signup, ValidationError};
use thiserror::Error;

use crate::auth::{generate_token, hash_password, hash_token, verify_password};
use crate::models::{NewUser, User, UserChanges};
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unable to authenticate with provided credentials.")]
    InvalidCredentials,

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AccountError::Validation(ValidationError::field(
                "email",
                "user with this email already exists.",
            )),
            e => AccountError::Store(e),
        }
    }
}

impl From<argon2::password_hash::Error> for AccountError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AccountError::Hash(e.to_string())
    }
}

fn insert_user(
    store: &dyn Store,
    signup: &Signup,
    is_superuser: bool,
) -> Result<User, AccountError> {
    let password_hash = hash_password(&signup.password)?;

    let user = store.create_user(&NewUser {
        email: &signup.email,
        name: &signup.name,
        password_hash: &password_hash,
        is_staff: is_superuser,
        is_superuser,
    })?;

    tracing::info!(user_id = user.id, "Created user");
    Ok(user)
}

/// Register a regular user from client-supplied fields.
pub fn create_user(
    store: &dyn Store,
    email: Option<&str>,
    password: Option<&str>,
    name: Option<&str>,
) -> Result<User, AccountError> {
    let signup = Signup::validate(email, password, name)?;
    insert_user(store, &signup, false)
}

/// Register an administrator with staff and superuser flags set. The password
/// length policy does not apply here.
pub fn create_superuser(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> Result<User, AccountError> {
    if password.is_empty() {
        return Err(ValidationError::field("password", BLANK).into());
    }

    let signup = Signup {
        email: validate_email(email)?,
        password: password.to_string(),
        name: String::new(),
    };
    insert_user(store, &signup, true)
}

pub fn check_password(user: &User, raw: &str) -> bool {
    verify_password(raw, &user.password_hash)
}

/// Apply a validated profile change. A new password is stored hashed.
pub fn update_profile(
    store: &dyn Store,
    user: &User,
    changes: ProfileChanges,
) -> Result<User, AccountError> {
    let password_hash = changes.password.as_deref().map(hash_password).transpose()?;

    let updated = store.update_user(
        user.id,
        &UserChanges {
            email: changes.email,
            name: changes.name,
            password_hash,
        },
    )?;

    Ok(updated)
}

/// Exchange credentials for a new API token. Every successful call issues a
/// fresh token; earlier tokens stay valid.
pub fn issue_token(
    store: &dyn Store,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<String, AccountError> {
    let mut errors = ValidationError::new();
    let email = email.map(normalize_email).filter(|e| !e.is_empty());
    let password = password.filter(|p| !p.is_empty());
    if email.is_none() {
        errors.add("email", BLANK);
    }
    if password.is_none() {
        errors.add("password", BLANK);
    }
    let (Some(email), Some(password)) = (email, password) else {
        return Err(errors.into());
    };

    let user = store
        .find_user_by_email(&email)?
        .filter(|user| user.is_active)
        .ok_or(AccountError::InvalidCredentials)?;

    if !check_password(&user, password) {
        return Err(AccountError::InvalidCredentials);
    }

    let token = generate_token();
    store.create_token(user.id, &hash_token(&token))?;

    Ok(token)
}
