pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod links;
pub mod listings;
pub mod navigation;
pub mod profiles;
pub mod search;
pub mod telemetry;
