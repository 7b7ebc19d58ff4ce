use std::sync::Arc;

use axum::{
    debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, routing::get, Json, Router
};
use hearthdir::{auth, config::Config, db, profiles, search, session::{SessionUser, SESSION_USER}, storage::Storage, AppResult, AppState};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::load().expect("load configuration");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hearthdir=info")),
        )
        .init();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(config.database_url.as_str())
        .await
        .expect("connect database");
    db::init(&db_pool).await.expect("apply schema");

    let clients = auth::Clients::from_config(&config).expect("configure oauth client");
    let storage = Storage::new(&config.storage_url, &config.storage_key);

    let app_state = AppState {
        db_pool,
        clients,
        storage,
        search_feed: Arc::new(search::SearchFeed::default()),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/api/search", get(search::search_page))
        .route("/api/search/latest", get(search::latest_results))

        .merge(auth::router())
        .nest("/api", profiles::router())

        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str())
        .await
        .expect("bind listener");
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await.expect("serve");
}

#[debug_handler(state = AppState)]
async fn index(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = session.get::<SessionUser>(SESSION_USER).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let in_directory = match profiles::is_in_directory(&db_pool, &user.user_id).await {
        Ok(member) => member,
        Err(err) => {
            tracing::error!(user_id = %user.user_id, error = %err, "membership probe failed");
            false
        }
    };

    Ok(Json(serde_json::json!({
        "userId": user.user_id,
        "name": user.name,
        "handle": user.handle,
        "inDirectory": in_directory,
    })).into_response())
}
