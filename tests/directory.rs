use std::time::Duration;

use hearthdir::db;
use hearthdir::profiles::codes::{HousemateCount, HousingType, Location, MoveIn, RoomPrice};
use hearthdir::profiles::community::{self, CommunityInput};
use hearthdir::profiles::housing::{self, HousingProfileInput};
use hearthdir::profiles::organizer::{self, OrganizerProfileInput};
use hearthdir::profiles::{directory_entry, is_in_directory, DirectoryType};
use hearthdir::storage::Storage;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory db");
    db::init(&pool).await.expect("apply schema");
    pool
}

fn housing_input(user_id: &str) -> HousingProfileInput {
    HousingProfileInput {
        user_id: user_id.to_owned(),
        housing_type: HousingType::Lease,
        move_in: MoveIn::Asap,
        housemate_count: HousemateCount::ThreeToFive,
        details: "quiet, early riser".to_owned(),
        link: "https://example.com/me".to_owned(),
        contact_method: "me@example.com".to_owned(),
        contact_phone: None,
        contact_email: Some("me@example.com".to_owned()),
    }
}

fn organizer_input(user_id: &str) -> OrganizerProfileInput {
    OrganizerProfileInput {
        user_id: user_id.to_owned(),
        housing_type: HousingType::Lease,
        lease_start: MoveIn::WithinThreeMonths,
        housemate_count: HousemateCount::SixToTwelve,
        details: "starting a house near the park".to_owned(),
        link: "https://example.com/house".to_owned(),
        contact_method: "https://twitter.com/org".to_owned(),
    }
}

fn community_input(user_id: &str) -> CommunityInput {
    CommunityInput {
        user_id: user_id.to_owned(),
        name: "Fern House".to_owned(),
        description: "12 residents, shared kitchen".to_owned(),
        resident_count: HousemateCount::SixToTwelve,
        room_price_range: RoomPrice::TenToFifteenHundred,
        location: Location::Berkeley,
        website_url: "https://fern.example.com".to_owned(),
        image_url: None,
        contact_method: "hello@fern.example.com".to_owned(),
    }
}

#[tokio::test]
async fn organizer_wins_when_multiple_profile_types_exist() {
    let pool = pool().await;
    organizer::upsert(&pool, &organizer_input("u-1")).await.expect("save organizer");
    let saved = community::save(&pool, &community_input("u-1")).await;
    assert!(saved.success);

    let entry = directory_entry(&pool, "u-1")
        .await
        .expect("lookup")
        .expect("entry present");
    assert_eq!(entry.directory_type, DirectoryType::Organizer);
    assert_eq!(entry.details.as_deref(), Some("starting a house near the park"));
    assert_eq!(entry.move_in, Some(MoveIn::WithinThreeMonths.code()));
}

#[tokio::test]
async fn lookup_returns_none_with_no_rows_anywhere() {
    let pool = pool().await;
    let entry = directory_entry(&pool, "u-absent").await.expect("lookup");
    assert!(entry.is_none());
    assert!(!is_in_directory(&pool, "u-absent").await.expect("probe"));
}

#[tokio::test]
async fn community_entry_maps_listing_fields() {
    let pool = pool().await;
    let saved = community::save(&pool, &community_input("u-2")).await;
    assert!(saved.success);

    let entry = directory_entry(&pool, "u-2").await.unwrap().unwrap();
    assert_eq!(entry.directory_type, DirectoryType::Community);
    assert_eq!(entry.link.as_deref(), Some("https://fern.example.com"));
    assert_eq!(entry.name.as_deref(), Some("Fern House"));
    assert_eq!(entry.housing_type, Some(RoomPrice::TenToFifteenHundred.code()));
    assert_eq!(entry.housemate_count, Some(HousemateCount::SixToTwelve.code()));
    assert_eq!(entry.location, Some(Location::Berkeley.code()));
    assert_eq!(entry.move_in, None);

    assert!(is_in_directory(&pool, "u-2").await.unwrap());
}

#[tokio::test]
async fn community_save_inserts_then_updates() {
    let pool = pool().await;
    let mut input = community_input("u-3");

    assert!(community::save(&pool, &input).await.success);
    let first = community::get(&pool, "u-3").await.unwrap().unwrap();
    assert_eq!(first.name, "Fern House");

    input.name = "Fern House II".to_owned();
    input.room_price_range = RoomPrice::FifteenToTwoThousand;
    assert!(community::save(&pool, &input).await.success);

    let second = community::get(&pool, "u-3").await.unwrap().unwrap();
    assert_eq!(second.name, "Fern House II");
    assert_eq!(second.room_price_range, RoomPrice::FifteenToTwoThousand.code());
    // update path keeps the original profile_id
    assert_eq!(second.profile_id, first.profile_id);
}

#[tokio::test]
async fn deleting_missing_rows_is_idempotent() {
    let pool = pool().await;
    housing::delete(&pool, "nobody").await.expect("housing delete");
    organizer::delete(&pool, "nobody").await.expect("organizer delete");
    community::delete(&pool, "nobody").await.expect("community delete");
}

#[tokio::test]
async fn touch_active_refreshes_timestamp_only() {
    let pool = pool().await;
    housing::upsert(&pool, &housing_input("u-4")).await.expect("save");
    let before = housing::get(&pool, "u-4").await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let rows = housing::touch_active(&pool, "u-4").await.expect("touch");
    assert_eq!(rows, 1);

    let after = housing::get(&pool, "u-4").await.unwrap().unwrap();
    assert!(after.last_updated_date > before.last_updated_date);
    assert_eq!(after.pref_housemate_details, before.pref_housemate_details);
    assert_eq!(after.profile_id, before.profile_id);

    // no row, no refresh
    assert_eq!(housing::touch_active(&pool, "nobody").await.unwrap(), 0);
    assert_eq!(organizer::touch_active(&pool, "nobody").await.unwrap(), 0);
    assert_eq!(community::touch_active(&pool, "nobody").await.unwrap(), 0);
}

#[tokio::test]
async fn delete_everywhere_clears_all_three_tables() {
    let pool = pool().await;
    housing::upsert(&pool, &housing_input("u-5")).await.expect("housing");
    organizer::upsert(&pool, &organizer_input("u-5")).await.expect("organizer");
    assert!(community::save(&pool, &community_input("u-5")).await.success);
    assert!(is_in_directory(&pool, "u-5").await.unwrap());

    // nothing listens on this port, so the image removal fails; rows are
    // deleted first and the failure is reported in the outcome
    let storage = Storage::new("http://127.0.0.1:9/storage/v1", "key");
    let outcome = hearthdir::profiles::delete_everywhere(&pool, &storage, "u-5").await;

    assert!(!is_in_directory(&pool, "u-5").await.unwrap());
    assert!(!outcome.success);
    assert!(outcome.message.is_some());
}
