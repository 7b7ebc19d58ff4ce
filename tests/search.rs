use std::time::Duration;

use hearthdir::db;
use hearthdir::profiles::codes::{HousemateCount, HousingType, MoveIn};
use hearthdir::profiles::housing::{self, HousingProfileInput};
use hearthdir::search::{ProfileFilter, SearchFeed, SearchQuery, PAGE_SIZE};
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

fn input(user_id: &str, move_in: MoveIn, housemates: HousemateCount) -> HousingProfileInput {
    HousingProfileInput {
        user_id: user_id.to_owned(),
        housing_type: HousingType::Lease,
        move_in,
        housemate_count: housemates,
        details: format!("profile for {user_id}"),
        link: format!("https://example.com/{user_id}"),
        contact_method: format!("{user_id}@example.com"),
        contact_phone: None,
        contact_email: None,
    }
}

async fn seed(pool: &SqlitePool) {
    // distinct timestamps so the ordering is deterministic
    for (user_id, move_in, housemates) in [
        ("u-old", MoveIn::Asap, HousemateCount::OneToTwo),
        ("u-mid", MoveIn::WithinThreeMonths, HousemateCount::ThreeToFive),
        ("u-new", MoveIn::WithinThreeMonths, HousemateCount::OneToTwo),
    ] {
        housing::upsert(pool, &input(user_id, move_in, housemates)).await.expect("seed");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn unfiltered_search_orders_newest_first() {
    let pool = pool().await;
    seed(&pool).await;

    let hits = housing::list(&pool, 0, PAGE_SIZE, &ProfileFilter::default())
        .await
        .expect("list");

    let order: Vec<&str> = hits.iter().map(|hit| hit.profile.user_id.as_str()).collect();
    assert_eq!(order, vec!["u-new", "u-mid", "u-old"]);
    assert!(hits.windows(2).all(|pair| {
        pair[0].profile.last_updated_date > pair[1].profile.last_updated_date
    }));
    // page shorter than the limit: no more pages
    assert!((hits.len() as i64) < PAGE_SIZE);
}

#[tokio::test]
async fn moving_time_filter_matches_only_that_code() {
    let pool = pool().await;
    seed(&pool).await;

    let filter = ProfileFilter {
        move_in: Some(MoveIn::WithinThreeMonths),
        ..ProfileFilter::default()
    };
    let hits = housing::list(&pool, 0, PAGE_SIZE, &filter).await.expect("list");

    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|hit| hit.profile.pref_move_in == MoveIn::WithinThreeMonths.code()));
}

#[tokio::test]
async fn filters_conjoin() {
    let pool = pool().await;
    seed(&pool).await;

    let filter = ProfileFilter {
        move_in: Some(MoveIn::WithinThreeMonths),
        housemate_count: Some(HousemateCount::OneToTwo),
        ..ProfileFilter::default()
    };
    let hits = housing::list(&pool, 0, PAGE_SIZE, &filter).await.expect("list");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].profile.user_id, "u-new");
}

#[tokio::test]
async fn offset_window_is_half_open() {
    let pool = pool().await;
    seed(&pool).await;

    let page = housing::list(&pool, 1, 1, &ProfileFilter::default()).await.expect("list");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].profile.user_id, "u-mid");

    let past_end = housing::list(&pool, 10, 1, &ProfileFilter::default()).await.expect("list");
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn search_results_carry_owner_identity() {
    let pool = pool().await;
    hearthdir::users::create(&pool, hearthdir::users::NewUser {
        user_id: "u-owned".to_owned(),
        name: "Grace".to_owned(),
        contact_email: "grace@example.com".to_owned(),
        twitter_handle: "graceh".to_owned(),
        twitter_avatar_url: "https://pbs.example.com/g_400x400.jpg".to_owned(),
        twitter_id: 7,
    }).await.expect("create user");
    housing::upsert(&pool, &input("u-owned", MoveIn::Asap, HousemateCount::OneToTwo))
        .await
        .expect("seed");

    let hits = housing::list(&pool, 0, PAGE_SIZE, &ProfileFilter::default()).await.unwrap();
    assert_eq!(hits[0].owner_name.as_deref(), Some("Grace"));
    assert_eq!(hits[0].owner_handle.as_deref(), Some("graceh"));
}

#[tokio::test]
async fn upsert_then_get_round_trips_with_fresh_timestamp() {
    let pool = pool().await;
    let mut profile = input("u-rt", MoveIn::Asap, HousemateCount::OneToTwo);
    housing::upsert(&pool, &profile).await.expect("first save");
    let before = housing::get(&pool, "u-rt").await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    profile.details = "updated details".to_owned();
    profile.move_in = MoveIn::OverThreeMonths;
    housing::upsert(&pool, &profile).await.expect("second save");

    let after = housing::get(&pool, "u-rt").await.unwrap().unwrap();
    assert_eq!(after.pref_housemate_details, "updated details");
    assert_eq!(after.pref_move_in, MoveIn::OverThreeMonths.code());
    assert!(after.last_updated_date > before.last_updated_date);
}

#[test]
fn filter_parses_query_codes() {
    let query = SearchQuery {
        moving_time: Some("2".to_owned()),
        ..SearchQuery::default()
    };
    let filter = ProfileFilter::from_query(&query).expect("valid filter");
    assert_eq!(filter.move_in, Some(MoveIn::WithinThreeMonths));
    assert!(filter.housing_type.is_none());
    assert!(filter.housemate_count.is_none());

    let empty = ProfileFilter::from_query(&SearchQuery::default()).expect("empty filter");
    assert!(empty.is_empty());
}

#[test]
fn filter_rejects_unknown_codes() {
    let query = SearchQuery {
        moving_time: Some("7".to_owned()),
        ..SearchQuery::default()
    };
    assert!(ProfileFilter::from_query(&query).is_err());

    let garbage = SearchQuery {
        housing_type: Some("soonish".to_owned()),
        ..SearchQuery::default()
    };
    assert!(ProfileFilter::from_query(&garbage).is_err());
}

#[test]
fn stale_search_responses_are_discarded() {
    let feed = SearchFeed::default();

    let first = feed.begin();
    let second = feed.begin();
    assert!(second > first);

    // the later request resolves first
    assert!(feed.complete(second, Vec::new()));
    // the earlier, slower response must not overwrite it
    assert!(!feed.complete(first, Vec::new()));

    let (token, results) = feed.snapshot();
    assert_eq!(token, second);
    assert!(results.is_empty());
}

#[tokio::test]
async fn latest_results_serve_the_applied_page() {
    let pool = pool().await;
    seed(&pool).await;

    let feed = SearchFeed::default();
    let token = feed.begin();
    let page = housing::list(&pool, 0, PAGE_SIZE, &ProfileFilter::default())
        .await
        .expect("list");
    assert!(feed.complete(token, page.clone()));

    // the retained page is what the cached-results endpoint hands back
    let (applied, retained) = feed.snapshot();
    assert_eq!(applied, token);
    assert_eq!(retained, page);
}
