use sqlx::SqlitePool;

// user_id doubles as the foreign key into users; at most one row per user
// per table. profile_id is a random 10-digit display id, not a key.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        user_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        contact_email TEXT NOT NULL,
        twitter_handle TEXT NOT NULL,
        twitter_avatar_url TEXT NOT NULL,
        twitter_id INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS housing_search_profiles (
        user_id TEXT PRIMARY KEY,
        profile_id INTEGER NOT NULL,
        pref_housing_type INTEGER NOT NULL,
        pref_move_in INTEGER NOT NULL,
        pref_housemate_count INTEGER NOT NULL,
        pref_housemate_details TEXT NOT NULL,
        link TEXT NOT NULL,
        pref_contact_method TEXT NOT NULL,
        contact_phone TEXT,
        contact_email TEXT,
        last_updated_date INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS organizer_profiles (
        user_id TEXT PRIMARY KEY,
        profile_id INTEGER NOT NULL,
        pref_housing_type INTEGER NOT NULL,
        pref_lease_start INTEGER NOT NULL,
        pref_housemate_count INTEGER NOT NULL,
        pref_house_details TEXT NOT NULL,
        link TEXT NOT NULL,
        pref_contact_method TEXT NOT NULL,
        last_updated_date INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS communities (
        user_id TEXT PRIMARY KEY,
        profile_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        resident_count INTEGER NOT NULL,
        room_price_range INTEGER NOT NULL,
        location INTEGER NOT NULL,
        website_url TEXT NOT NULL,
        image_url TEXT,
        pref_contact_method TEXT NOT NULL,
        last_updated_date INTEGER NOT NULL
    )",
];

pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// Timestamp convention for `last_updated_date`: unix milliseconds.
pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
