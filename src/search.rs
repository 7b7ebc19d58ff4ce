//! Search over housing-search profiles: an equality-conjunction filter,
//! newest first, fixed page size.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::{debug_handler, extract::{Query, State}, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::error;

use crate::error::ValidationError;
use crate::profiles::codes::{parse_code, HousemateCount, HousingType, MoveIn};
use crate::profiles::housing::{self, HousingSearchHit};
use crate::{AppResult, AppState};

pub const PAGE_SIZE: i64 = 25;

/// Raw query-string input; every field optional, codes as strings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub housing_type: Option<String>,
    pub housemate_count: Option<String>,
    pub moving_time: Option<String>,
    pub offset: Option<i64>,
}

/// Validated filter. An absent field imposes no constraint; there are no
/// sentinel values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProfileFilter {
    pub housing_type: Option<HousingType>,
    pub housemate_count: Option<HousemateCount>,
    pub move_in: Option<MoveIn>,
}

impl ProfileFilter {
    pub fn from_query(query: &SearchQuery) -> Result<Self, ValidationError> {
        Ok(ProfileFilter {
            housing_type: query.housing_type.as_deref()
                .map(|raw| parse_code("housing_type", raw, HousingType::from_code))
                .transpose()?,
            housemate_count: query.housemate_count.as_deref()
                .map(|raw| parse_code("housemate_count", raw, HousemateCount::from_code))
                .transpose()?,
            move_in: query.moving_time.as_deref()
                .map(|raw| parse_code("moving_time", raw, MoveIn::from_code))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.housing_type.is_none() && self.housemate_count.is_none() && self.move_in.is_none()
    }
}

/// Holds the most recent search results, sequenced by a monotonically
/// increasing request token. Rapid re-invocation races the round trips; a
/// completion carrying a token older than the newest applied one is
/// discarded, so a slow early response can never overwrite a fast later one.
#[derive(Debug, Default)]
pub struct SearchFeed {
    next_token: AtomicU64,
    current: Mutex<(u64, Vec<HousingSearchHit>)>,
}

impl SearchFeed {
    /// Stamps a new request. Tokens start at 1; the default current token 0
    /// means "nothing applied yet".
    pub fn begin(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Applies a finished request's results unless a newer request already
    /// landed. Returns whether the results were taken.
    pub fn complete(&self, token: u64, results: Vec<HousingSearchHit>) -> bool {
        let mut current = self.current.lock().expect("search feed lock");
        if token < current.0 {
            return false;
        }
        *current = (token, results);
        true
    }

    pub fn snapshot(&self) -> (u64, Vec<HousingSearchHit>) {
        self.current.lock().expect("search feed lock").clone()
    }
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub offset: i64,
    /// False once a page comes back shorter than the page size.
    pub more: bool,
    pub results: Vec<HousingSearchHit>,
}

#[debug_handler(state = AppState)]
pub async fn search_page(
    State(db_pool): State<SqlitePool>,
    State(feed): State<Arc<SearchFeed>>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Response> {
    let filter = ProfileFilter::from_query(&query)?;
    let offset = query.offset.unwrap_or(0).max(0);

    let token = feed.begin();
    let results = match housing::list(&db_pool, offset, PAGE_SIZE, &filter).await {
        Ok(results) => results,
        Err(err) => {
            // lossy on purpose: a failed read serves the empty state
            error!(error = %err, "housing profile search failed");
            Vec::new()
        }
    };
    let more = results.len() as i64 == PAGE_SIZE;
    feed.complete(token, results.clone());

    Ok(Json(SearchPage { offset, more, results }).into_response())
}

/// Serves the most recently applied results without touching the database.
#[debug_handler(state = AppState)]
pub async fn latest_results(State(feed): State<Arc<SearchFeed>>) -> AppResult<Response> {
    let (_, results) = feed.snapshot();
    Ok(Json(results).into_response())
}
