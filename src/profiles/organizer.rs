//! Organizer profiles: people with (or assembling) a place, looking for
//! housemates. Same key and cardinality rules as housing-search profiles,
//! separate table.

use axum::{debug_handler, extract::State, http::StatusCode, response::{IntoResponse, Response}, Form, Json};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tower_sessions::Session;
use tracing::warn;

use crate::db;
use crate::error::StoreError;
use crate::{AppResult, AppState};

use super::codes::{ContactMethod, HousemateCount, HousingType, MoveIn};
use super::housing::random_profile_id;
use super::{require_user, resolve_contact, SaveOutcome};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct OrganizerProfile {
    pub user_id: String,
    pub profile_id: i64,
    pub pref_housing_type: i64,
    pub pref_lease_start: i64,
    pub pref_housemate_count: i64,
    pub pref_house_details: String,
    pub link: String,
    pub pref_contact_method: String,
    pub last_updated_date: i64,
}

#[derive(Debug, Clone)]
pub struct OrganizerProfileInput {
    pub user_id: String,
    pub housing_type: HousingType,
    pub lease_start: MoveIn,
    pub housemate_count: HousemateCount,
    pub details: String,
    pub link: String,
    pub contact_method: String,
}

pub async fn get(pool: &SqlitePool, user_id: &str) -> Result<Option<OrganizerProfile>, StoreError> {
    let profile = sqlx::query_as::<_, OrganizerProfile>(
        "SELECT * FROM organizer_profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

pub async fn upsert(pool: &SqlitePool, input: &OrganizerProfileInput) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO organizer_profiles \
            (user_id, profile_id, pref_housing_type, pref_lease_start, pref_housemate_count, \
             pref_house_details, link, pref_contact_method, last_updated_date) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(user_id) DO UPDATE SET \
             profile_id = excluded.profile_id, \
             pref_housing_type = excluded.pref_housing_type, \
             pref_lease_start = excluded.pref_lease_start, \
             pref_housemate_count = excluded.pref_housemate_count, \
             pref_house_details = excluded.pref_house_details, \
             link = excluded.link, \
             pref_contact_method = excluded.pref_contact_method, \
             last_updated_date = excluded.last_updated_date",
    )
    .bind(&input.user_id)
    .bind(random_profile_id())
    .bind(input.housing_type.code())
    .bind(input.lease_start.code())
    .bind(input.housemate_count.code())
    .bind(&input.details)
    .bind(&input.link)
    .bind(&input.contact_method)
    .bind(db::now_millis())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn touch_active(pool: &SqlitePool, user_id: &str) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "UPDATE organizer_profiles SET last_updated_date = ? WHERE user_id = ?",
    )
    .bind(db::now_millis())
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, user_id: &str) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM organizer_profiles WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrganizerForm {
    pub description: String,
    pub housing_type: String,
    pub move_in: String,
    pub housemates: String,
    pub link: String,
    pub contact_method: String,
    #[serde(default)]
    pub phone: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn mine(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = require_user(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    match get(&db_pool, &user.user_id).await? {
        Some(profile) => Ok(Json(profile).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn save(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<OrganizerForm>,
) -> AppResult<Response> {
    let Some(user) = require_user(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    let contact_method = ContactMethod::from_option(&form.contact_method)?;
    let contact = resolve_contact(
        &db_pool, contact_method, &user.user_id, &user.handle, &form.phone, &form.link,
    ).await?;

    let input = OrganizerProfileInput {
        user_id: user.user_id.clone(),
        housing_type: HousingType::from_option(&form.housing_type)?,
        lease_start: MoveIn::from_option(&form.move_in)?,
        housemate_count: HousemateCount::from_option(&form.housemates)?,
        details: form.description,
        link: form.link,
        contact_method: contact,
    };

    let outcome = match upsert(&db_pool, &input).await {
        Ok(()) => SaveOutcome::ok(),
        Err(err) => {
            warn!(user_id = %user.user_id, error = %err, "organizer profile save failed");
            SaveOutcome::failed(err.to_string())
        }
    };
    Ok(Json(outcome).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn keep_alive(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = require_user(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    let rows = touch_active(&db_pool, &user.user_id).await?;
    if rows == 0 {
        warn!(user_id = %user.user_id, "keep-alive with no organizer profile");
    }
    Ok(Json(SaveOutcome::ok()).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn remove(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = require_user(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    let outcome = match delete(&db_pool, &user.user_id).await {
        Ok(()) => SaveOutcome::ok(),
        Err(err) => SaveOutcome::failed(err.to_string()),
    };
    Ok(Json(outcome).into_response())
}
