pub mod codes;
pub mod community;
pub mod housing;
pub mod organizer;

use axum::{debug_handler, extract::{Path, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{delete, get, post}, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::error;

use crate::error::StoreError;
use crate::session::{SessionUser, SESSION_USER};
use crate::storage::Storage;
use crate::users;
use crate::{AppResult, AppState};

use codes::ContactMethod;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/directory/{user_id}", get(directory_lookup))
        .route("/directory/{user_id}/member", get(directory_member))
        .route("/profiles", delete(delete_profiles))
        .route("/profiles/housing", get(housing::mine).post(housing::save).delete(housing::remove))
        .route("/profiles/housing/active", post(housing::keep_alive))
        .route("/profiles/organizer", get(organizer::mine).post(organizer::save).delete(organizer::remove))
        .route("/profiles/organizer/active", post(organizer::keep_alive))
        .route("/profiles/community", get(community::mine).post(community::save_listing).delete(community::remove))
        .route("/profiles/community/active", post(community::keep_alive))
        .route("/communities", get(community::listings))
        .route("/community/image", post(community::upload_image).delete(community::remove_image))
}

/// Which table a directory entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DirectoryType {
    #[serde(rename = "organizer_profiles")]
    Organizer,
    #[serde(rename = "housing_search_profiles")]
    HousingSearch,
    #[serde(rename = "communities")]
    Community,
}

/// The three profile shapes normalized into one. Fields a source table does
/// not carry stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub directory_type: DirectoryType,
    pub link: Option<String>,
    pub contact_method: Option<String>,
    pub details: Option<String>,
    pub housemate_count: Option<i64>,
    /// Housing type code for profiles, room price range code for communities.
    pub housing_type: Option<i64>,
    /// Move-in window for searchers, lease start for organizers.
    pub move_in: Option<i64>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<i64>,
}

/// Probes the three tables in priority order and returns the first hit.
///
/// The schema permits a user to hold rows in more than one table; the fixed
/// order organizer -> housing-search -> community is the deliberate
/// tie-break, and probing stops at the first match.
pub async fn directory_entry(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<DirectoryEntry>, StoreError> {
    if let Some(profile) = organizer::get(pool, user_id).await? {
        return Ok(Some(DirectoryEntry {
            directory_type: DirectoryType::Organizer,
            link: Some(profile.link),
            contact_method: Some(profile.pref_contact_method),
            details: Some(profile.pref_house_details),
            housemate_count: Some(profile.pref_housemate_count),
            housing_type: Some(profile.pref_housing_type),
            move_in: Some(profile.pref_lease_start),
            name: None,
            image_url: None,
            location: None,
        }));
    }

    if let Some(profile) = housing::get(pool, user_id).await? {
        return Ok(Some(DirectoryEntry {
            directory_type: DirectoryType::HousingSearch,
            link: Some(profile.link),
            contact_method: Some(profile.pref_contact_method),
            details: Some(profile.pref_housemate_details),
            housemate_count: Some(profile.pref_housemate_count),
            housing_type: Some(profile.pref_housing_type),
            move_in: Some(profile.pref_move_in),
            name: None,
            image_url: None,
            location: None,
        }));
    }

    if let Some(listing) = community::get(pool, user_id).await? {
        return Ok(Some(DirectoryEntry {
            directory_type: DirectoryType::Community,
            link: Some(listing.website_url),
            contact_method: Some(listing.pref_contact_method),
            details: Some(listing.description),
            housemate_count: Some(listing.resident_count),
            housing_type: Some(listing.room_price_range),
            move_in: None,
            name: Some(listing.name),
            image_url: listing.image_url,
            location: Some(listing.location),
        }));
    }

    Ok(None)
}

/// Existence probe across the three tables, cheapest query per table.
pub async fn is_in_directory(pool: &SqlitePool, user_id: &str) -> Result<bool, StoreError> {
    for table in ["communities", "organizer_profiles", "housing_search_profiles"] {
        let hit = sqlx::query(&format!("SELECT 1 FROM {table} WHERE user_id = ? LIMIT 1"))
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        if hit.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Write results surfaced to the caller instead of thrown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SaveOutcome {
    pub fn ok() -> Self {
        SaveOutcome { success: true, message: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        SaveOutcome { success: false, message: Some(message.into()) }
    }
}

/// Full directory opt-out: clears all three tables and the stored image.
/// Row deletes run first; an image removal failure leaves the rows gone and
/// reports failure, matching the save/delete surfacing policy.
pub async fn delete_everywhere(
    pool: &SqlitePool,
    storage: &Storage,
    user_id: &str,
) -> SaveOutcome {
    if let Err(err) = community::delete(pool, user_id).await {
        error!(user_id, error = %err, "community delete failed");
        return SaveOutcome::failed(err.to_string());
    }
    if let Err(err) = organizer::delete(pool, user_id).await {
        error!(user_id, error = %err, "organizer delete failed");
        return SaveOutcome::failed(err.to_string());
    }
    if let Err(err) = housing::delete(pool, user_id).await {
        error!(user_id, error = %err, "housing delete failed");
        return SaveOutcome::failed(err.to_string());
    }

    if let Err(err) = storage.delete_image(user_id).await {
        error!(user_id, error = %err, "image delete failed");
        return SaveOutcome::failed(err.to_string());
    }

    SaveOutcome::ok()
}

/// Translates a chosen contact method into the concrete value stored with
/// the profile.
pub(crate) async fn resolve_contact(
    pool: &SqlitePool,
    method: ContactMethod,
    user_id: &str,
    handle: &str,
    phone: &str,
    link: &str,
) -> Result<String, StoreError> {
    Ok(match method {
        ContactMethod::Phone => phone.to_owned(),
        ContactMethod::Twitter => format!("https://twitter.com/{handle}"),
        ContactMethod::Website => link.to_owned(),
        ContactMethod::Email => users::contact_email(pool, user_id).await?.unwrap_or_default(),
    })
}

pub(crate) async fn require_user(session: &Session) -> AppResult<Option<SessionUser>> {
    Ok(session.get::<SessionUser>(SESSION_USER).await?)
}

#[debug_handler(state = AppState)]
async fn directory_lookup(
    Path(user_id): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    // a failed read is indistinguishable from an empty directory here;
    // log it and serve the empty state
    match directory_entry(&db_pool, &user_id).await {
        Ok(Some(entry)) => Ok(Json(entry).into_response()),
        Ok(None) => Ok(StatusCode::NOT_FOUND.into_response()),
        Err(err) => {
            error!(user_id, error = %err, "directory lookup failed");
            Ok(StatusCode::NOT_FOUND.into_response())
        }
    }
}

#[debug_handler(state = AppState)]
async fn directory_member(
    Path(user_id): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let member = match is_in_directory(&db_pool, &user_id).await {
        Ok(member) => member,
        Err(err) => {
            error!(user_id, error = %err, "membership probe failed");
            false
        }
    };
    Ok(Json(serde_json::json!({ "member": member })).into_response())
}

#[debug_handler(state = AppState)]
async fn delete_profiles(
    State(db_pool): State<SqlitePool>,
    State(storage): State<Storage>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = require_user(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    let outcome = delete_everywhere(&db_pool, &storage, &user.user_id).await;
    Ok(Json(outcome).into_response())
}
