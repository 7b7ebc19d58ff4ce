use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct UserRecord {
    pub user_id: String,
    pub name: String,
    pub contact_email: String,
    pub twitter_handle: String,
    pub twitter_avatar_url: String,
    pub twitter_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub name: String,
    pub contact_email: String,
    pub twitter_handle: String,
    pub twitter_avatar_url: String,
    pub twitter_id: i64,
}

/// Externally-sourced fields only. `user_id` and `contact_email` are never
/// patched after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub twitter_handle: Option<String>,
    pub twitter_avatar_url: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.twitter_handle.is_none() && self.twitter_avatar_url.is_none()
    }
}

/// Absence is a valid "new user" signal; only transport failure is an error.
pub async fn fetch(pool: &SqlitePool, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
    let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(record)
}

/// Idempotent upsert keyed on `user_id`; returns the stored row.
pub async fn create(pool: &SqlitePool, new_user: NewUser) -> Result<UserRecord, StoreError> {
    if new_user.user_id.is_empty() {
        return Err(StoreError::MissingField("user_id"));
    }
    if new_user.name.is_empty() {
        return Err(StoreError::MissingField("name"));
    }

    let record = sqlx::query_as::<_, UserRecord>(
        "INSERT INTO users (user_id, name, contact_email, twitter_handle, twitter_avatar_url, twitter_id) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON CONFLICT(user_id) DO UPDATE SET \
             name = excluded.name, \
             contact_email = excluded.contact_email, \
             twitter_handle = excluded.twitter_handle, \
             twitter_avatar_url = excluded.twitter_avatar_url, \
             twitter_id = excluded.twitter_id \
         RETURNING *",
    )
    .bind(&new_user.user_id)
    .bind(&new_user.name)
    .bind(&new_user.contact_email)
    .bind(&new_user.twitter_handle)
    .bind(&new_user.twitter_avatar_url)
    .bind(new_user.twitter_id)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Applies only the populated fields of the patch. A missing user affects
/// zero rows and is not an error; the count is returned so callers (and
/// tests) can observe it.
pub async fn update(pool: &SqlitePool, user_id: &str, patch: UserPatch) -> Result<u64, StoreError> {
    if patch.is_empty() {
        return Ok(0);
    }

    let mut query = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
    {
        let mut set = query.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ");
            set.push_bind_unseparated(name.clone());
        }
        if let Some(handle) = &patch.twitter_handle {
            set.push("twitter_handle = ");
            set.push_bind_unseparated(handle.clone());
        }
        if let Some(avatar) = &patch.twitter_avatar_url {
            set.push("twitter_avatar_url = ");
            set.push_bind_unseparated(avatar.clone());
        }
    }
    query.push(" WHERE user_id = ");
    query.push_bind(user_id);

    let result = query.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Resolves the stored contact email, used when a profile picks "email" as
/// its contact method.
pub async fn contact_email(pool: &SqlitePool, user_id: &str) -> Result<Option<String>, StoreError> {
    let row = sqlx::query_as::<_, (String,)>("SELECT contact_email FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(email,)| email))
}
