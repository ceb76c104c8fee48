//! User profiles: setup after first sign-in, later edits, and avatar upload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{ObjectStorage, ProfileStore, StorageError, StoragePath, StoreError};
use crate::listings::{PhotoRef, UserId};

pub const PHONE_LENGTH: usize = 9;
pub const MIN_NAME_CHARS: usize = 3;

/// Document in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    /// Photo URL, empty when the user never set one.
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    /// First profile after sign-up or a federated sign-in.
    Setup,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ProfileIssue {
    #[error("enter a valid name")]
    InvalidName,
    #[error("the phone must start with 9 and have 9 digits")]
    InvalidPhone,
}

/// Values collected by the profile screens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    /// URL already on file, kept when no new avatar is picked.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub avatar: Option<PhotoRef>,
}

impl ProfileForm {
    /// Prefill from a federated identity, whose display names may carry digits.
    pub fn from_federated(display_name: &str, email: &str, photo_url: Option<&str>) -> Self {
        Self {
            name: sanitize_federated_name(display_name),
            email: email.to_string(),
            image: photo_url.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }

    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            email: profile.email.clone(),
            image: profile.image.clone(),
            avatar: None,
        }
    }

    pub fn validate(&self, mode: ProfileMode) -> Result<(), ProfileIssue> {
        let name_ok = match mode {
            ProfileMode::Setup => self.name.trim().chars().count() >= MIN_NAME_CHARS,
            ProfileMode::Edit => !self.name.is_empty(),
        };
        if !name_ok {
            return Err(ProfileIssue::InvalidName);
        }

        let phone_ok = self.phone.chars().count() == PHONE_LENGTH
            && (mode == ProfileMode::Edit || self.phone.starts_with('9'));
        if !phone_ok {
            return Err(ProfileIssue::InvalidPhone);
        }
        Ok(())
    }
}

pub fn sanitize_federated_name(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_ascii_digit()).collect()
}

/// Keystroke filter for the name field: digits are refused.
pub fn accepts_name_input(input: &str) -> bool {
    !input.chars().any(|c| c.is_ascii_digit())
}

/// Keystroke filter for the phone field.
pub fn accepts_phone_input(input: &str, mode: ProfileMode) -> bool {
    let digits = input.chars().all(|c| c.is_ascii_digit()) && input.len() <= PHONE_LENGTH;
    match mode {
        ProfileMode::Setup => digits && (input.is_empty() || input.starts_with('9')),
        ProfileMode::Edit => digits,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error(transparent)]
    Invalid(#[from] ProfileIssue),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct ProfileService<P, O> {
    profiles: Arc<P>,
    storage: Arc<O>,
}

impl<P, O> ProfileService<P, O>
where
    P: ProfileStore + 'static,
    O: ObjectStorage + 'static,
{
    pub fn new(profiles: Arc<P>, storage: Arc<O>) -> Self {
        Self { profiles, storage }
    }

    pub async fn load(&self, user: &UserId) -> Result<Option<UserProfile>, ProfileError> {
        Ok(self.profiles.fetch(user).await?)
    }

    /// Validate, upload a new avatar if one was picked, then merge-write the profile.
    pub async fn save(
        &self,
        user: &UserId,
        mode: ProfileMode,
        form: &ProfileForm,
    ) -> Result<UserProfile, ProfileError> {
        form.validate(mode)?;

        let image = match &form.avatar {
            Some(avatar) => {
                self.storage
                    .upload(&StoragePath::profile_avatar(user), avatar, &mime::IMAGE_JPEG)
                    .await?
            }
            None => form.image.clone(),
        };

        let profile = UserProfile {
            id: user.clone(),
            name: form.name.trim().to_string(),
            phone: form.phone.clone(),
            email: form.email.clone(),
            image,
        };
        self.profiles.merge(&profile).await?;
        info!(user = %user, mode = ?mode, "profile saved");
        Ok(profile)
    }
}
