//! Housing-search profiles: people looking for a place. This is the only
//! profile kind the search engine pages over.

use axum::{debug_handler, extract::State, http::StatusCode, response::{IntoResponse, Response}, Form, Json};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tower_sessions::Session;
use tracing::warn;

use crate::db;
use crate::error::StoreError;
use crate::search::ProfileFilter;
use crate::{AppResult, AppState};

use super::codes::{ContactMethod, HousemateCount, HousingType, MoveIn};
use super::{require_user, resolve_contact, SaveOutcome};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct HousingProfile {
    pub user_id: String,
    pub profile_id: i64,
    pub pref_housing_type: i64,
    pub pref_move_in: i64,
    pub pref_housemate_count: i64,
    pub pref_housemate_details: String,
    pub link: String,
    pub pref_contact_method: String,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub last_updated_date: i64,
}

/// A search result row: the profile plus the owner's display identity.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct HousingSearchHit {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: HousingProfile,
    pub owner_name: Option<String>,
    pub owner_handle: Option<String>,
    pub owner_avatar: Option<String>,
}

/// Validated input for an upsert; enumerated fields are already coerced.
#[derive(Debug, Clone)]
pub struct HousingProfileInput {
    pub user_id: String,
    pub housing_type: HousingType,
    pub move_in: MoveIn,
    pub housemate_count: HousemateCount,
    pub details: String,
    pub link: String,
    pub contact_method: String,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

pub(crate) fn random_profile_id() -> i64 {
    rand::rng().random_range(1_000_000_000..10_000_000_000)
}

pub async fn get(pool: &SqlitePool, user_id: &str) -> Result<Option<HousingProfile>, StoreError> {
    let profile = sqlx::query_as::<_, HousingProfile>(
        "SELECT * FROM housing_search_profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

/// Newest first, half-open `[offset, offset + limit)` window. A page shorter
/// than `limit` means there are no more pages.
pub async fn list(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
    filter: &ProfileFilter,
) -> Result<Vec<HousingSearchHit>, StoreError> {
    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT h.*, u.name AS owner_name, u.twitter_handle AS owner_handle, \
                u.twitter_avatar_url AS owner_avatar \
         FROM housing_search_profiles h \
         LEFT JOIN users u ON u.user_id = h.user_id",
    );

    let mut sep = " WHERE ";
    if let Some(housing_type) = filter.housing_type {
        query.push(sep).push("h.pref_housing_type = ").push_bind(housing_type.code());
        sep = " AND ";
    }
    if let Some(housemate_count) = filter.housemate_count {
        query.push(sep).push("h.pref_housemate_count = ").push_bind(housemate_count.code());
        sep = " AND ";
    }
    if let Some(move_in) = filter.move_in {
        query.push(sep).push("h.pref_move_in = ").push_bind(move_in.code());
    }

    query.push(" ORDER BY h.last_updated_date DESC LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let hits = query.build_query_as::<HousingSearchHit>().fetch_all(pool).await?;
    Ok(hits)
}

/// Wholesale replace keyed on `user_id`, with a fresh `last_updated_date`.
/// There is no partial-update path.
pub async fn upsert(pool: &SqlitePool, input: &HousingProfileInput) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO housing_search_profiles \
            (user_id, profile_id, pref_housing_type, pref_move_in, pref_housemate_count, \
             pref_housemate_details, link, pref_contact_method, contact_phone, contact_email, \
             last_updated_date) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(user_id) DO UPDATE SET \
             profile_id = excluded.profile_id, \
             pref_housing_type = excluded.pref_housing_type, \
             pref_move_in = excluded.pref_move_in, \
             pref_housemate_count = excluded.pref_housemate_count, \
             pref_housemate_details = excluded.pref_housemate_details, \
             link = excluded.link, \
             pref_contact_method = excluded.pref_contact_method, \
             contact_phone = excluded.contact_phone, \
             contact_email = excluded.contact_email, \
             last_updated_date = excluded.last_updated_date",
    )
    .bind(&input.user_id)
    .bind(random_profile_id())
    .bind(input.housing_type.code())
    .bind(input.move_in.code())
    .bind(input.housemate_count.code())
    .bind(&input.details)
    .bind(&input.link)
    .bind(&input.contact_method)
    .bind(&input.contact_phone)
    .bind(&input.contact_email)
    .bind(db::now_millis())
    .execute(pool)
    .await?;

    Ok(())
}

/// Keep-alive: refreshes `last_updated_date` without touching anything else.
/// Returns the affected row count (0 when no profile exists).
pub async fn touch_active(pool: &SqlitePool, user_id: &str) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "UPDATE housing_search_profiles SET last_updated_date = ? WHERE user_id = ?",
    )
    .bind(db::now_millis())
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Idempotent: deleting a row that does not exist is fine.
pub async fn delete(pool: &SqlitePool, user_id: &str) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM housing_search_profiles WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HousingForm {
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
    Form(form): Form<HousingForm>,
) -> AppResult<Response> {
    let Some(user) = require_user(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    let contact_method = ContactMethod::from_option(&form.contact_method)?;
    let contact = resolve_contact(
        &db_pool, contact_method, &user.user_id, &user.handle, &form.phone, &form.link,
    ).await?;

    let input = HousingProfileInput {
        user_id: user.user_id.clone(),
        housing_type: HousingType::from_option(&form.housing_type)?,
        move_in: MoveIn::from_option(&form.move_in)?,
        housemate_count: HousemateCount::from_option(&form.housemates)?,
        details: form.description,
        link: form.link,
        contact_method: contact,
        contact_phone: (!form.phone.is_empty()).then_some(form.phone),
        contact_email: (!user.email.is_empty()).then(|| user.email.clone()),
    };

    let outcome = match upsert(&db_pool, &input).await {
        Ok(()) => SaveOutcome::ok(),
        Err(err) => {
            warn!(user_id = %user.user_id, error = %err, "housing profile save failed");
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
        warn!(user_id = %user.user_id, "keep-alive with no housing profile");
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
