//! Admin authorization: session verification, the dashboard gate and
//! open-redirect-safe `next` handling.

pub mod gate;
pub mod redirect;
pub mod session;

pub use self::gate::{AdminGate, GateDecision, require_admin_session};
pub use self::redirect::{NextCandidate, is_safe_next, login_redirect_target, resolve_next};
pub use self::session::{
    ADMIN_SESSION_COOKIE, AUTHENTICATED_MARKER, LiteralCookieVerifier, SessionMode,
    SessionVerifier, SignedCookieVerifier, is_authenticated,
};
