//! # Dohy (studio site server core)
//!
//! `dohy` serves the rule-governed parts of the Dohy studio site: the admin
//! dashboard gate, open-redirect-safe login redirects, keyed site settings and
//! the URL canonicalization helpers shared by course, library and post pages.
//!
//! ## Admin gate
//!
//! Every path under `/dashboard` is intercepted before it reaches a handler.
//! The `admin_session` cookie is handed to a [`auth::SessionVerifier`]; when it
//! does not verify, the visitor is sent to `/admin-login?next=<path>`. The
//! `next` value is always passed through [`auth::resolve_next`], so it can only
//! ever point back into this site.
//!
//! - **Literal cookie:** the default verifier accepts the exact value
//!   `authenticated`. It carries no integrity protection.
//! - **Signed cookie:** opt-in verifier that only accepts the marker when it was
//!   signed with the server key.
//!
//! ## Settings
//!
//! Settings are keyed JSON documents with at most one record per key. The store
//! is constructed once at startup and passed to handlers; it is backed by
//! memory, Postgres, or a remote query service.
//!
//! ## Slugs
//!
//! Any path segment derived from free text goes through
//! [`content::normalize_slug`], which strips diacritics and collapses everything
//! outside `[a-z0-9]` into single hyphens.

pub mod api;
pub mod auth;
pub mod cli;
pub mod content;
pub mod settings;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
