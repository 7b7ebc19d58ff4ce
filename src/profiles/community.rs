//! Community/space listings: an existing house presenting itself to the
//! directory. Unlike the profile tables this writes through an existence
//! read followed by an update or insert, not an atomic upsert.

use axum::{body::Bytes, debug_handler, extract::{Query, State}, http::StatusCode, response::{IntoResponse, Response}, Form, Json};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tower_sessions::Session;
use tracing::{error, warn};

use crate::db;
use crate::error::StoreError;
use crate::storage::Storage;
use crate::{AppResult, AppState};

use super::codes::{ContactMethod, HousemateCount, Location, RoomPrice};
use super::housing::random_profile_id;
use super::{require_user, resolve_contact, SaveOutcome};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct CommunityListing {
    pub user_id: String,
    pub profile_id: i64,
    pub name: String,
    pub description: String,
    pub resident_count: i64,
    pub room_price_range: i64,
    pub location: i64,
    pub website_url: String,
    pub image_url: Option<String>,
    pub pref_contact_method: String,
    pub last_updated_date: i64,
}

#[derive(Debug, Clone)]
pub struct CommunityInput {
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub resident_count: HousemateCount,
    pub room_price_range: RoomPrice,
    pub location: Location,
    pub website_url: String,
    pub image_url: Option<String>,
    pub contact_method: String,
}

pub async fn get(pool: &SqlitePool, user_id: &str) -> Result<Option<CommunityListing>, StoreError> {
    let listing = sqlx::query_as::<_, CommunityListing>(
        "SELECT * FROM communities WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(listing)
}

/// Newest listings first, for the browse page.
pub async fn list(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
) -> Result<Vec<CommunityListing>, StoreError> {
    let listings = sqlx::query_as::<_, CommunityListing>(
        "SELECT * FROM communities ORDER BY last_updated_date DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(listings)
}

/// Update-if-exists-else-insert. Failures come back in the outcome, not as
/// an error.
pub async fn save(pool: &SqlitePool, input: &CommunityInput) -> SaveOutcome {
    let existing = match get(pool, &input.user_id).await {
        Ok(existing) => existing,
        Err(err) => return SaveOutcome::failed(err.to_string()),
    };

    let written = if existing.is_some() {
        sqlx::query(
            "UPDATE communities SET \
                name = ?, description = ?, resident_count = ?, room_price_range = ?, \
                location = ?, website_url = ?, image_url = ?, pref_contact_method = ?, \
                last_updated_date = ? \
             WHERE user_id = ?",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.resident_count.code())
        .bind(input.room_price_range.code())
        .bind(input.location.code())
        .bind(&input.website_url)
        .bind(&input.image_url)
        .bind(&input.contact_method)
        .bind(db::now_millis())
        .bind(&input.user_id)
        .execute(pool)
        .await
    } else {
        sqlx::query(
            "INSERT INTO communities \
                (user_id, profile_id, name, description, resident_count, room_price_range, \
                 location, website_url, image_url, pref_contact_method, last_updated_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.user_id)
        .bind(random_profile_id())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.resident_count.code())
        .bind(input.room_price_range.code())
        .bind(input.location.code())
        .bind(&input.website_url)
        .bind(&input.image_url)
        .bind(&input.contact_method)
        .bind(db::now_millis())
        .execute(pool)
        .await
    };

    match written {
        Ok(_) => SaveOutcome::ok(),
        Err(err) => SaveOutcome::failed(err.to_string()),
    }
}

pub async fn touch_active(pool: &SqlitePool, user_id: &str) -> Result<u64, StoreError> {
    let result = sqlx::query("UPDATE communities SET last_updated_date = ? WHERE user_id = ?")
        .bind(db::now_millis())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, user_id: &str) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM communities WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommunityForm {
    pub name: String,
    pub description: String,
    pub room_price: String,
    pub housemates: String,
    pub link: String,
    #[serde(default)]
    pub image_link: String,
    pub contact_method: String,
    #[serde(default)]
    pub phone: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub offset: i64,
}

const COMMUNITIES_PAGE_SIZE: i64 = 10;

#[debug_handler(state = AppState)]
pub(crate) async fn listings(
    State(db_pool): State<SqlitePool>,
    Query(ListQuery { offset }): Query<ListQuery>,
) -> AppResult<Response> {
    let listings = match list(&db_pool, offset.max(0), COMMUNITIES_PAGE_SIZE).await {
        Ok(listings) => listings,
        Err(err) => {
            error!(error = %err, "community listing read failed");
            Vec::new()
        }
    };
    Ok(Json(listings).into_response())
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
        Some(listing) => Ok(Json(listing).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn save_listing(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<CommunityForm>,
) -> AppResult<Response> {
    let Some(user) = require_user(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    let contact_method = ContactMethod::from_option(&form.contact_method)?;
    let contact = resolve_contact(
        &db_pool, contact_method, &user.user_id, &user.handle, &form.phone, &form.link,
    ).await?;

    let input = CommunityInput {
        user_id: user.user_id.clone(),
        name: form.name,
        description: form.description,
        resident_count: HousemateCount::from_option(&form.housemates)?,
        room_price_range: RoomPrice::from_option(&form.room_price)?,
        location: Location::from_option(&form.location)?,
        website_url: form.link,
        image_url: (!form.image_link.is_empty()).then_some(form.image_link),
        contact_method: contact,
    };

    let outcome = save(&db_pool, &input).await;
    if !outcome.success {
        warn!(user_id = %user.user_id, "community listing save failed");
    }
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
        warn!(user_id = %user.user_id, "keep-alive with no community listing");
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

/// Overwrites the per-user image object and returns its public URL.
#[debug_handler(state = AppState)]
pub(crate) async fn upload_image(
    State(storage): State<Storage>,
    session: Session,
    body: Bytes,
) -> AppResult<Response> {
    let Some(user) = require_user(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    match storage.save_image(&user.user_id, body.to_vec()).await {
        Ok(public_url) => Ok(Json(serde_json::json!({
            "success": true,
            "publicURL": public_url,
            // cache-busted variant, so a re-upload shows up immediately
            "imageUrl": storage.image_url(&user.user_id),
        })).into_response()),
        Err(err) => {
            error!(user_id = %user.user_id, error = %err, "image upload failed");
            Ok(Json(SaveOutcome::failed(err.to_string())).into_response())
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn remove_image(
    State(storage): State<Storage>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = require_user(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    let outcome = match storage.delete_image(&user.user_id).await {
        Ok(()) => SaveOutcome::ok(),
        Err(err) => SaveOutcome::failed(err.to_string()),
    };
    Ok(Json(outcome).into_response())
}
