use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::metrics;
use crate::state::AppState;
use crate::web::templates::{BillDetailPage, BillListPage, BillsFeed, NotFoundPage, VoteDetailPage};
use crate::web::views::{self, bills::BillListParams};

/// Turn a rendered page or an error into a response. Missing records get the 404 page.
fn page(name: &'static str, result: Result<String>) -> Response {
    match result {
        Ok(html) => {
            metrics::pages::view(name);
            Html(html).into_response()
        }
        Err(AppError::NotFound(what)) => {
            metrics::pages::not_found(name);
            debug!(page = name, missing = %what, "page not found");
            not_found_page(&AppError::NotFound(what).to_string())
        }
        Err(err) => err.into_response(),
    }
}

fn not_found_page(message: &str) -> Response {
    let body = NotFoundPage { message }
        .render()
        .unwrap_or_else(|_| message.to_string());
    (StatusCode::NOT_FOUND, Html(body)).into_response()
}

async fn render_bill_list(state: &AppState, abbr: &str, params: BillListParams) -> Result<String> {
    let ctx = views::bills::bill_list(state.storage.as_ref(), abbr, params).await?;
    Ok(BillListPage { ctx: &ctx }.render()?)
}

async fn render_bill_detail(state: &AppState, abbr: &str, session: &str, bill_id: &str) -> Result<String> {
    let ctx = views::bill::bill_detail(state.storage.as_ref(), &state.site_url, abbr, session, bill_id).await?;
    Ok(BillDetailPage { ctx: &ctx }.render()?)
}

async fn render_vote_detail(state: &AppState, vote_id: &str) -> Result<String> {
    let ctx = views::vote::vote_detail(state.storage.as_ref(), vote_id).await?;
    Ok(VoteDetailPage { ctx: &ctx }.render()?)
}

async fn render_bills_feed(state: &AppState, abbr: &str) -> Result<String> {
    let ctx = views::feed::bills_feed(state.storage.as_ref(), &state.site_url, abbr).await?;
    Ok(BillsFeed { ctx: &ctx }.render()?)
}

pub async fn bill_list(
    State(state): State<AppState>,
    Path(abbr): Path<String>,
    Query(params): Query<BillListParams>,
) -> Response {
    page("bills", render_bill_list(&state, &abbr, params).await)
}

pub async fn bill_detail(
    State(state): State<AppState>,
    Path((abbr, session, bill_id)): Path<(String, String, String)>,
) -> Response {
    page("bill", render_bill_detail(&state, &abbr, &session, &bill_id).await)
}

pub async fn vote_detail(State(state): State<AppState>, Path(vote_id): Path<String>) -> Response {
    page("vote", render_vote_detail(&state, &vote_id).await)
}

pub async fn bills_feed(State(state): State<AppState>, Path(abbr): Path<String>) -> Response {
    match render_bills_feed(&state, &abbr).await {
        Ok(xml) => {
            metrics::pages::view("feed");
            ([(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")], xml).into_response()
        }
        Err(err) => page("feed", Err(err)),
    }
}

/// Permanent redirect from a slash-less page path to the canonical one, keeping the query.
pub async fn add_trailing_slash(uri: Uri) -> Redirect {
    let target = match uri.query() {
        Some(query) => format!("{}/?{}", uri.path(), query),
        None => format!("{}/", uri.path()),
    };
    Redirect::permanent(&target)
}

/// Fallback for any path no route matches.
pub async fn fallback() -> Response {
    not_found_page("The page you requested does not exist.")
}
