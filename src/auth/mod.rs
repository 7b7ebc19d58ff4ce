mod clients;
mod lockin;
mod login;
mod logout;
pub mod signin;

use axum::{routing::get, Router};

pub use clients::Clients;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login))
        .route("/lockin", get(lockin::lockin))
        .route("/logout", get(logout::logout))
}
