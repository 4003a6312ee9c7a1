//! Server-rendered public pages.

pub mod handlers;
pub mod templates;
pub mod views;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:state/bills/", get(handlers::bill_list))
        .route("/:state/bills/feed/", get(handlers::bills_feed))
        .route("/:state/bills/:session/:bill_id/", get(handlers::bill_detail))
        .route("/vote/:vote_id/", get(handlers::vote_detail))
        // `openstatesUrl` and feed links carry no trailing slash
        .route("/:state/bills", get(handlers::add_trailing_slash))
        .route("/:state/bills/feed", get(handlers::add_trailing_slash))
        .route("/:state/bills/:session/:bill_id", get(handlers::add_trailing_slash))
        .route("/vote/:vote_id", get(handlers::add_trailing_slash))
}
