//! First-login reconciliation: a single pass that decides whether the
//! authenticated identity needs a new `users` row, a metadata refresh, or
//! nothing at all.

use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::SignInError;
use crate::session::{SessionUser, SESSION_USER};
use crate::users::{self, NewUser, UserPatch, UserRecord};
use crate::{AppError, AppResult};

const AVATAR_NORMAL: &str = "_normal";
const AVATAR_HIGH_RES: &str = "_400x400";

#[derive(Debug)]
pub enum SignInOutcome {
    /// No authenticated session; nothing to reconcile.
    NoSession,
    Success { initial_sign_in: bool },
    Failed(SignInError),
}

/// Swaps the provider's low-resolution avatar suffix for the high-resolution
/// one. A URL that already carries the high-res suffix passes through
/// unchanged, which the stored-vs-fresh comparison relies on.
pub fn high_res_avatar(url: &str) -> String {
    url.replace(AVATAR_NORMAL, AVATAR_HIGH_RES)
}

/// Diff of externally-sourced fields between the stored record and the fresh
/// identity. Both avatar sides go through the high-res substitution, so the
/// stored copy (always written high-res) compares against like for like.
pub fn identity_patch(stored: &UserRecord, fresh: &SessionUser) -> UserPatch {
    let fresh_avatar = high_res_avatar(&fresh.avatar_url);

    UserPatch {
        name: (stored.name != fresh.name).then(|| fresh.name.clone()),
        twitter_handle: (stored.twitter_handle != fresh.handle).then(|| fresh.handle.clone()),
        twitter_avatar_url: (stored.twitter_avatar_url != fresh_avatar).then_some(fresh_avatar),
    }
}

/// Runs once per session start. Any failure inside the reconciliation is
/// caught and reported as a `Failed` outcome rather than propagated.
pub async fn handle_sign_in(pool: &SqlitePool, session_user: Option<&SessionUser>) -> SignInOutcome {
    let Some(user) = session_user else {
        return SignInOutcome::NoSession;
    };

    match reconcile(pool, user).await {
        Ok(initial_sign_in) => SignInOutcome::Success { initial_sign_in },
        Err(err) => {
            tracing::error!(user_id = %user.user_id, error = %err, "sign-in failed");
            SignInOutcome::Failed(err)
        }
    }
}

/// Runs the reconciler for a freshly authenticated identity and stores it in
/// the session only once reconciliation succeeds. A fatal sign-in failure
/// leaves the session without an identity, so every signed-in gate keeps
/// treating the caller as signed out.
pub async fn establish_session(
    pool: &SqlitePool,
    session: &Session,
    user: &SessionUser,
) -> AppResult<bool> {
    match handle_sign_in(pool, Some(user)).await {
        SignInOutcome::Success { initial_sign_in } => {
            session.insert(SESSION_USER, user).await?;
            Ok(initial_sign_in)
        }
        SignInOutcome::Failed(err) => Err(AppError::from(err)),
        // a concrete identity was supplied, so the reconciler cannot report
        // a missing session
        SignInOutcome::NoSession => Ok(false),
    }
}

async fn reconcile(pool: &SqlitePool, user: &SessionUser) -> Result<bool, SignInError> {
    let stored = users::fetch(pool, &user.user_id)
        .await
        .map_err(SignInError::Lookup)?;

    let Some(stored) = stored else {
        // first login: no users row yet
        users::create(pool, NewUser {
            user_id: user.user_id.clone(),
            name: user.name.clone(),
            contact_email: user.email.clone(),
            twitter_handle: user.handle.clone(),
            twitter_avatar_url: high_res_avatar(&user.avatar_url),
            twitter_id: user.twitter_id,
        })
        .await
        .map_err(SignInError::Create)?;

        info!(user_id = %user.user_id, "created user record");
        return Ok(true);
    };

    let patch = identity_patch(&stored, user);
    if !patch.is_empty() {
        // stale display metadata is tolerable; a failed refresh never fails
        // the sign-in
        if let Err(err) = users::update(pool, &user.user_id, patch).await {
            warn!(user_id = %user.user_id, error = %err, "identity metadata refresh failed");
        }
    }

    Ok(false)
}
