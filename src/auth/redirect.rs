//! Open-redirect-safe resolution of the `next` login parameter.
//!
//! A `next` value is only honored when it is a same-site absolute path. Anything
//! that a browser could read as protocol-relative (`//host`, `/\host`) falls back
//! to the caller's default path. Rejections are silent; there is nothing useful
//! to report to the visitor.

use url::form_urlencoded;

/// The raw `next` value as it arrives from a query string: missing, given once,
/// or repeated.
#[derive(Clone, Copy, Debug, Default)]
pub enum NextCandidate<'a> {
    #[default]
    Absent,
    Single(&'a str),
    Many(&'a [String]),
}

impl<'a> NextCandidate<'a> {
    fn first(self) -> Option<&'a str> {
        match self {
            Self::Absent => None,
            Self::Single(value) => Some(value),
            Self::Many(values) => values.first().map(String::as_str),
        }
    }
}

impl<'a> From<&'a str> for NextCandidate<'a> {
    fn from(value: &'a str) -> Self {
        Self::Single(value)
    }
}

impl<'a> From<Option<&'a str>> for NextCandidate<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Self::Absent, Self::Single)
    }
}

impl<'a> From<&'a [String]> for NextCandidate<'a> {
    fn from(values: &'a [String]) -> Self {
        Self::Many(values)
    }
}

/// Returns `true` when `path` is a non-empty same-site absolute path.
#[must_use]
pub fn is_safe_next(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

/// Resolve a `next` candidate into a redirect destination.
///
/// Lists resolve through their first element. Safe paths come back unchanged,
/// so resolving an already-resolved path is a no-op.
#[must_use]
pub fn resolve_next<'a>(candidate: impl Into<NextCandidate<'a>>, default_path: &str) -> String {
    match candidate.into().first() {
        Some(path) if is_safe_next(path) => path.to_string(),
        _ => default_path.to_string(),
    }
}

/// Build the login URL that carries `requested` back as `next`.
///
/// The path is percent-encoded and only attached when it is safe; otherwise the
/// bare login path is returned.
#[must_use]
pub fn login_redirect_target(login_path: &str, requested: &str) -> String {
    if !is_safe_next(requested) {
        return login_path.to_string();
    }
    let encoded: String = form_urlencoded::byte_serialize(requested.as_bytes()).collect();
    format!("{login_path}?next={encoded}")
}

/// Collect every `next` value from a raw query string, in order.
#[must_use]
pub fn next_values(query: Option<&str>) -> Vec<String> {
    query.map_or_else(Vec::new, |query| {
        form_urlencoded::parse(query.as_bytes())
            .filter(|(name, _)| name == "next")
            .map(|(_, value)| value.into_owned())
            .collect()
    })
}
