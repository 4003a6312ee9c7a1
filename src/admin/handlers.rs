use axum::{
    extract::{Path, Query, State},
    http::{header, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::admin;
use crate::admin::changes::{self, NewPersonRequest, PersonDeltaRequest, RetirementRequest};
use crate::domain::{DeltaSet, DeltaSetRecord, NameStatus, PullStatus, UnmatchedName};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::storage::SyncOutcome;

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    /// One of `U`, `I`, `S`
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct MatchParams {
    pub person_id: String,
}

#[derive(Debug, Serialize)]
pub struct MatchResult {
    pub id: i64,
    pub person_id: String,
    pub linked: usize,
}

#[derive(Debug, Serialize)]
pub struct RefreshResult {
    pub upserted: usize,
    pub removed: usize,
}

impl From<SyncOutcome> for RefreshResult {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            upserted: outcome.upserted,
            removed: outcome.removed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub sponsorships: HashMap<String, i64>,
    pub votes: HashMap<String, i64>,
}

const DEFAULT_CREATED_BY: &str = "admin";

fn created_by(given: Option<String>) -> String {
    given
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_CREATED_BY.to_string())
}

fn parse_pull_status(code: &str) -> Result<PullStatus> {
    PullStatus::from_code(code).ok_or_else(|| AppError::validation(format!("Unknown pull status \"{code}\"")))
}

#[derive(Debug, Deserialize)]
pub struct DeltaSetQuery {
    /// One of `N`, `C`, `M`, `R`
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RetirementParams {
    #[serde(flatten)]
    pub retirement: RetirementRequest,
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewPersonParams {
    #[serde(flatten)]
    pub person: NewPersonRequest,
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PersonChangesParams {
    pub name: String,
    pub deltas: Vec<PersonDeltaRequest>,
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PullStatusParams {
    pub status: String,
    pub pr_url: Option<String>,
}

/// Compare the bearer token against the configured one. No token configured means closed.
pub fn is_authorized(expected: Option<&str>, authorization: Option<&str>) -> bool {
    match expected {
        None => false,
        Some(token) => authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|given| given.trim() == token)
            .unwrap_or(false),
    }
}

async fn require_token<B>(State(state): State<AppState>, request: Request<B>, next: Next<B>) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !is_authorized(state.admin_token.as_deref(), authorization) {
        warn!(path = %request.uri().path(), "rejected admin request");
        return AppError::Unauthorized.into_response();
    }
    next.run(request).await
}

pub async fn list_names(
    State(state): State<AppState>,
    Path((abbr, session)): Path<(String, String)>,
) -> Result<Json<Vec<UnmatchedName>>> {
    Ok(Json(
        admin::unmatched_names(state.storage.as_ref(), &abbr, &session).await?,
    ))
}

pub async fn check_names(
    State(state): State<AppState>,
    Path((abbr, session)): Path<(String, String)>,
) -> Result<Json<CheckResult>> {
    let storage = state.storage.as_ref();
    let session = admin::find_session(storage, &abbr, &session).await?;
    Ok(Json(CheckResult {
        sponsorships: admin::check_sponsorships(storage, &session).await?,
        votes: admin::check_votes(storage, &session).await?,
    }))
}

pub async fn refresh_names(
    State(state): State<AppState>,
    Path((abbr, session)): Path<(String, String)>,
) -> Result<Json<RefreshResult>> {
    let outcome = admin::update_unmatched(state.storage.as_ref(), &abbr, &session).await?;
    Ok(Json(outcome.into()))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<StatusParams>,
) -> Result<Json<UnmatchedName>> {
    let status = NameStatus::from_code(&params.status)
        .ok_or_else(|| AppError::validation(format!("Unknown status \"{}\"", params.status)))?;
    Ok(Json(admin::set_status(state.storage.as_ref(), id, status).await?))
}

pub async fn match_name(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<MatchParams>,
) -> Result<Json<MatchResult>> {
    let linked = admin::apply_match(state.storage.as_ref(), id, &params.person_id).await?;
    Ok(Json(MatchResult {
        id,
        person_id: params.person_id,
        linked,
    }))
}

pub async fn list_delta_sets(
    State(state): State<AppState>,
    Query(query): Query<DeltaSetQuery>,
) -> Result<Json<Vec<DeltaSet>>> {
    let status = query.status.as_deref().map(parse_pull_status).transpose()?;
    Ok(Json(changes::list_delta_sets(state.storage.as_ref(), status).await?))
}

pub async fn get_delta_set(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<DeltaSetRecord>> {
    Ok(Json(changes::get_delta_set(state.storage.as_ref(), id).await?))
}

pub async fn propose_changes(
    State(state): State<AppState>,
    Json(params): Json<PersonChangesParams>,
) -> Result<Json<DeltaSetRecord>> {
    let created_by = created_by(params.created_by);
    Ok(Json(
        changes::propose_person_changes(state.storage.as_ref(), &params.name, params.deltas, &created_by).await?,
    ))
}

pub async fn retire_person(
    State(state): State<AppState>,
    Json(params): Json<RetirementParams>,
) -> Result<Json<DeltaSetRecord>> {
    let created_by = created_by(params.created_by);
    Ok(Json(
        changes::retire_person(state.storage.as_ref(), params.retirement, &created_by).await?,
    ))
}

pub async fn propose_new_person(
    State(state): State<AppState>,
    Json(params): Json<NewPersonParams>,
) -> Result<Json<DeltaSetRecord>> {
    let created_by = created_by(params.created_by);
    Ok(Json(
        changes::propose_new_person(state.storage.as_ref(), params.person, &created_by).await?,
    ))
}

pub async fn set_pull_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<PullStatusParams>,
) -> Result<Json<DeltaSet>> {
    let status = parse_pull_status(&params.status)?;
    Ok(Json(
        changes::update_pull_status(state.storage.as_ref(), id, status, params.pr_url.as_deref()).await?,
    ))
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/people/sessions/:state/:session/names", get(list_names))
        .route("/admin/people/sessions/:state/:session/check", get(check_names))
        .route("/admin/people/sessions/:state/:session/refresh", post(refresh_names))
        .route("/admin/people/names/:id/status", post(set_status))
        .route("/admin/people/names/:id/match", post(match_name))
        .route("/admin/people/deltas", get(list_delta_sets).post(propose_changes))
        .route("/admin/people/deltas/:id", get(get_delta_set))
        .route("/admin/people/deltas/:id/pr", post(set_pull_status))
        .route("/admin/people/retire", post(retire_person))
        .route("/admin/people/new", post(propose_new_person))
        .route_layer(middleware::from_fn_with_state(state, require_token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_when_no_token_configured() {
        assert!(!is_authorized(None, None));
        assert!(!is_authorized(None, Some("Bearer anything")));
    }

    #[test]
    fn created_by_falls_back_to_admin() {
        assert_eq!(created_by(None), "admin");
        assert_eq!(created_by(Some("  ".into())), "admin");
        assert_eq!(created_by(Some(" jane ".into())), "jane");
    }

    #[test]
    fn bearer_token_must_match() {
        assert!(is_authorized(Some("s3cret"), Some("Bearer s3cret")));
        assert!(!is_authorized(Some("s3cret"), Some("Bearer nope")));
        assert!(!is_authorized(Some("s3cret"), Some("s3cret")));
        assert!(!is_authorized(Some("s3cret"), None));
    }
}
