use serde::{Deserialize, Serialize};

pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const RETURN_URL: &str = "return_url";
pub const SESSION_USER: &str = "session_user";

/// The authenticated external identity for the current session, captured at
/// the OAuth callback and passed explicitly into every operation that needs
/// it. Created at sign-in, dropped at sign-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
    pub name: String,
    pub handle: String,
    pub email: String,
    pub avatar_url: String,
    pub twitter_id: i64,
    pub access_token: String,
}
