use anyhow::anyhow;
use axum::{debug_handler, extract::{Query, State}, response::{IntoResponse, Redirect}};
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeVerifier, TokenResponse};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::{session::{SessionUser, CSRF_STATE, PKCE_VERIFIER, RETURN_URL}, AppResult, AppState, GetField};

use super::{signin, Clients};

const USERINFO_URL: &str = "https://api.twitter.com/2/users/me";

#[derive(Deserialize)]
pub struct LockinQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn lockin(
    Query(LockinQuery { state, code }): Query<LockinQuery>,
    State(db_pool): State<SqlitePool>,
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<impl IntoResponse> {
    let state = CsrfToken::new(state.ok_or_else(|| anyhow!("OAuth: without state"))?);
    let code = AuthorizationCode::new(code.ok_or_else(|| anyhow!("OAuth: without code"))?);

    let Some(stored_state) = session.get::<String>(CSRF_STATE).await? else {
        return Err(anyhow!("no csrf_state"))?;
    };

    if state.secret().as_str() != stored_state.as_str() {
        return Err(anyhow!("csrf tokens don't match"))?;
    }

    let Some(pkce_verifier) = session.get::<String>(PKCE_VERIFIER).await? else {
        return Err(anyhow!("no pkce_verifier"))?;
    };

    let client = clients.twitter();
    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let token_result = client
        .exchange_code(code)
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
        .request_async(&http_client)
        .await?;

    let access_token = token_result.access_token().secret();
    let body: Value = http_client.get(USERINFO_URL)
        .query(&[("user.fields", "profile_image_url")])
        .bearer_auth(access_token)
        .send()
        .await?
        .json()
        .await?;

    let data = body.get_obj_field("data")?;
    let twitter_id: i64 = data.get_str_field("id")?.parse()?;
    let name = data.get_str_field("name")?;
    let handle = data.get_str_field("username")?;
    let avatar_url = data.get_str_field("profile_image_url")?;
    // not part of the default user object; present only when the app is
    // entitled to it
    let email = data.get("email")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    // stable opaque identifier derived from the provider's numeric id
    let user_id = Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        format!("twitter:{twitter_id}").as_bytes(),
    ).to_string();

    let session_user = SessionUser {
        user_id,
        name,
        handle,
        email,
        avatar_url,
        twitter_id,
        access_token: access_token.to_owned(),
    };
    // the identity lands in the session only once reconciliation succeeds
    let initial_sign_in = signin::establish_session(&db_pool, &session, &session_user).await?;
    info!(user_id = %session_user.user_id, initial_sign_in, "signed in");

    let return_url: String = session.get(RETURN_URL).await?.unwrap_or_else(|| "/".to_string());
    Ok(Redirect::to(return_url.as_str()))
}
