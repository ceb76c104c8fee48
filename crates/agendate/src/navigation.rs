//! Screen routes and the result handoff from the map picker back to the wizard.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::listings::{LocationCommit, OperationType};

/// Password segment marking a profile setup after a federated sign-in.
pub const GOOGLE_LOGIN: &str = "GOOGLE_LOGIN";

pub const LOCATION_LAT_KEY: &str = "location_lat";
pub const LOCATION_LNG_KEY: &str = "location_lng";
pub const LOCATION_ADDRESS_KEY: &str = "location_address";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    InitialScreen,
    LogIn,
    SignUp,
    /// `password` is `None` for federated accounts, which have no password to create.
    ProfileSetup {
        email: String,
        password: Option<String>,
    },
    Home,
    EditProfile,
    Publish(OperationType),
    PickLocation,
}

impl Route {
    pub fn profile_setup(email: impl Into<String>, password: impl Into<String>) -> Self {
        Route::ProfileSetup {
            email: email.into(),
            password: Some(password.into()),
        }
    }

    pub fn federated_setup(email: impl Into<String>) -> Self {
        Route::ProfileSetup {
            email: email.into(),
            password: None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::InitialScreen => f.write_str("initialScreen"),
            Route::LogIn => f.write_str("logIn"),
            Route::SignUp => f.write_str("SignUp"),
            Route::ProfileSetup { email, password } => write!(
                f,
                "profile/{email}/{}",
                password.as_deref().unwrap_or(GOOGLE_LOGIN)
            ),
            Route::Home => f.write_str("home"),
            Route::EditProfile => f.write_str("edit_profile"),
            Route::Publish(operation) => write!(f, "publish/{}", operation.label()),
            Route::PickLocation => f.write_str("pick_location"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("unknown route `{0}`")]
    Unknown(String),
    #[error("route `{0}` is missing a segment")]
    MissingSegment(String),
    #[error("`{0}` is not an operation type")]
    InvalidOperation(String),
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "initialScreen" => return Ok(Route::InitialScreen),
            "logIn" => return Ok(Route::LogIn),
            "SignUp" => return Ok(Route::SignUp),
            "home" => return Ok(Route::Home),
            "edit_profile" => return Ok(Route::EditProfile),
            "pick_location" => return Ok(Route::PickLocation),
            _ => {}
        }

        if let Some(rest) = raw.strip_prefix("profile/") {
            let (email, password) = rest
                .split_once('/')
                .filter(|(email, password)| !email.is_empty() && !password.is_empty())
                .ok_or_else(|| RouteError::MissingSegment(raw.to_string()))?;
            return Ok(if password == GOOGLE_LOGIN {
                Route::federated_setup(email)
            } else {
                Route::profile_setup(email, password)
            });
        }

        if let Some(tipo) = raw.strip_prefix("publish/") {
            return OperationType::from_label(tipo)
                .map(Route::Publish)
                .ok_or_else(|| RouteError::InvalidOperation(tipo.to_string()));
        }

        Err(RouteError::Unknown(raw.to_string()))
    }
}

/// Per-screen key/value results written by the screen above it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedState {
    values: HashMap<String, Value>,
}

impl SavedState {
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Picker result passed back to the publish screen through its saved state.
pub struct LocationHandoff;

impl LocationHandoff {
    pub fn offer(target: &mut SavedState, commit: &LocationCommit) {
        target.set(LOCATION_LAT_KEY, commit.lat);
        target.set(LOCATION_LNG_KEY, commit.lng);
        target.set(LOCATION_ADDRESS_KEY, commit.address.clone());
    }

    /// Consume a pending result. Needs both coordinates; clears all three keys on success.
    pub fn take(source: &mut SavedState) -> Option<LocationCommit> {
        let lat = source.get(LOCATION_LAT_KEY).and_then(Value::as_f64)?;
        let lng = source.get(LOCATION_LNG_KEY).and_then(Value::as_f64)?;
        let address = source
            .get(LOCATION_ADDRESS_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        for key in [LOCATION_LAT_KEY, LOCATION_LNG_KEY, LOCATION_ADDRESS_KEY] {
            source.remove(key);
        }
        Some(LocationCommit { lat, lng, address })
    }
}
