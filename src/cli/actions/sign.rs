//! `dohy sign-session`: mint the cookie accepted by `--session-mode signed`.

use crate::auth::{ADMIN_SESSION_COOKIE, AUTHENTICATED_MARKER, SignedCookieVerifier};
use anyhow::{Context, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub secret: SecretString,
}

/// `admin_session=<signed marker>`, ready for a `Set-Cookie` or `Cookie` header.
///
/// # Errors
/// Returns an error if the secret is too short.
pub fn cookie(args: &Args) -> Result<String> {
    let verifier = SignedCookieVerifier::new(&args.secret).context("Invalid --session-secret")?;
    Ok(format!(
        "{ADMIN_SESSION_COOKIE}={}",
        verifier.sign(AUTHENTICATED_MARKER)
    ))
}

/// Print the signed cookie to stdout.
/// # Errors
/// Returns an error if the secret is too short.
pub fn execute(args: &Args) -> Result<()> {
    println!("{}", cookie(args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SessionVerifier, session::extract_cookie};
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

    #[test]
    fn printed_cookie_passes_the_signed_check() {
        let raw_secret = "p".repeat(64);
        let Ok(line) = cookie(&Args {
            secret: SecretString::from(raw_secret.clone()),
        }) else {
            panic!("64 byte secret should sign");
        };
        assert!(line.starts_with("admin_session="));

        let mut headers = HeaderMap::new();
        let Ok(value) = HeaderValue::from_str(&line) else {
            panic!("cookie should be a valid header value");
        };
        headers.insert(COOKIE, value);
        let Ok(verifier) = SignedCookieVerifier::new(&SecretString::from(raw_secret)) else {
            panic!("key should be accepted");
        };
        let raw = extract_cookie(&headers, ADMIN_SESSION_COOKIE);
        assert!(verifier.verify(raw.as_deref()));
    }

    #[test]
    fn short_secret_is_rejected() {
        let args = Args {
            secret: SecretString::from("short".to_string()),
        };
        assert!(cookie(&args).is_err());
        assert!(execute(&args).is_err());
    }
}
