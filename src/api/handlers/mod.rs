//! API handlers for the Dohy site.
//!
//! Handlers receive the settings store and the admin gate through `Extension`
//! layers installed in [`crate::api::app`].

pub mod admin_login;
pub mod content;
pub mod dashboard;
pub mod health;
pub mod not_found;
pub mod root;
pub mod settings;
