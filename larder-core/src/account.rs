//! Account rules: email normalization and validation, password policy.
//!
//! Emails are the natural key for users. Normalization lower-cases the whole
//! address, so two addresses that differ only by case name the same account.

use crate::error::{ValidationError, BLANK, REQUIRED};

/// Minimum password length accepted from clients.
pub const MIN_PASSWORD_LENGTH: usize = 5;

pub const MAX_EMAIL_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 255;

/// Trim surrounding whitespace and lower-case the address. Idempotent.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Validate a client-supplied email and return its normalized form.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let normalized = normalize_email(email);

    if normalized.is_empty() {
        return Err(ValidationError::field("email", BLANK));
    }

    if !is_valid_email(&normalized) {
        return Err(ValidationError::field(
            "email",
            "Enter a valid email address.",
        ));
    }

    Ok(normalized)
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::field("password", BLANK));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::field(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
        ));
    }

    Ok(())
}

pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::field(
            "name",
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        ));
    }

    Ok(name.to_string())
}

/// A validated account creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Signup {
    /// Validate a public account creation request. `email` and `password` are
    /// required; a missing `name` is stored as an empty string.
    pub fn validate(
        email: Option<&str>,
        password: Option<&str>,
        name: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::new();

        let email = match email {
            Some(email) => validate_email(email).map_err(|e| errors.merge(e)).ok(),
            None => {
                errors.add("email", REQUIRED);
                None
            }
        };

        let password = match password {
            Some(password) => validate_password(password)
                .map(|()| password.to_string())
                .map_err(|e| errors.merge(e))
                .ok(),
            None => {
                errors.add("password", REQUIRED);
                None
            }
        };

        let name = validate_name(name.unwrap_or_default())
            .map_err(|e| errors.merge(e))
            .ok();

        match (email, password, name) {
            (Some(email), Some(password), Some(name)) if errors.is_empty() => Ok(Signup {
                email,
                password,
                name,
            }),
            _ => Err(errors),
        }
    }
}

/// A self-service profile change after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

impl ProfileChanges {
    /// Validate every supplied field. Errors from all fields are collected, and
    /// nothing is returned unless every field passes.
    pub fn validate(
        email: Option<&str>,
        name: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::new();
        let mut changes = ProfileChanges::default();

        if let Some(email) = email {
            match validate_email(email) {
                Ok(email) => changes.email = Some(email),
                Err(e) => errors.merge(e),
            }
        }

        if let Some(name) = name {
            match validate_name(name) {
                Ok(name) => changes.name = Some(name),
                Err(e) => errors.merge(e),
            }
        }

        if let Some(password) = password {
            match validate_password(password) {
                Ok(()) => changes.password = Some(password.to_string()),
                Err(e) => errors.merge(e),
            }
        }

        errors.into_result().map(|()| changes)
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.password.is_none()
    }
}
