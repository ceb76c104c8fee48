//! Credential form checks run before any call to the identity provider.

use serde::{Deserialize, Serialize};

use crate::navigation::Route;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirmation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum CredentialIssue {
    #[error("fill in every field")]
    MissingFields,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("the password needs at least 6 characters")]
    PasswordTooShort,
}

pub fn validate_login(credentials: &Credentials) -> Result<(), CredentialIssue> {
    if credentials.email.is_empty() || credentials.password.is_empty() {
        return Err(CredentialIssue::MissingFields);
    }
    Ok(())
}

pub fn validate_sign_up(form: &SignUpForm) -> Result<(), CredentialIssue> {
    if form.email.is_empty() || form.password.is_empty() {
        return Err(CredentialIssue::MissingFields);
    }
    if form.password != form.confirmation {
        return Err(CredentialIssue::PasswordMismatch);
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialIssue::PasswordTooShort);
    }
    Ok(())
}

/// Sign-up defers account creation to the profile setup screen.
pub fn sign_up(form: &SignUpForm) -> Result<Route, CredentialIssue> {
    validate_sign_up(form)?;
    Ok(Route::profile_setup(form.email.clone(), form.password.clone()))
}

/// Landing after a federated sign-in: home when a profile exists, otherwise setup.
pub fn route_after_federated_sign_in(email: Option<&str>, has_profile: bool) -> Route {
    if has_profile {
        Route::Home
    } else {
        Route::federated_setup(email.unwrap_or("user"))
    }
}
