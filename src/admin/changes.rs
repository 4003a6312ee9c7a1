//! Requested changes to people data: field edits, retirements and new legislators.
//!
//! Each request is recorded as a `DeltaSet` that is later published as a pull request
//! against the people repository. Only the bookkeeping lives here; the pull request
//! itself is opened elsewhere and reported back through [`update_pull_status`].

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domain::{DeltaSet, DeltaSetRecord, NewPerson, PersonDelta, PersonRetirement, PullStatus};
use crate::error::{AppError, Result};
use crate::jurisdictions::abbr_to_jid;
use crate::metrics;
use crate::storage::Storage;

const CHAMBERS: [&str; 3] = ["lower", "upper", "legislature"];

#[derive(Debug, Clone, Deserialize)]
pub struct RetirementRequest {
    pub person_id: String,
    pub date: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub is_dead: bool,
    #[serde(default)]
    pub vacant_seat: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPersonRequest {
    pub name: String,
    pub state: String,
    pub district: String,
    pub chamber: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonDeltaRequest {
    pub person_id: String,
    pub data_changes: serde_json::Value,
}

fn empty_set(name: String, created_by: &str) -> DeltaSetRecord {
    DeltaSetRecord {
        delta_set: DeltaSet {
            id: 0,
            name,
            pr_url: String::new(),
            pr_status: PullStatus::NotCreated,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        },
        person_deltas: Vec::new(),
        person_retirements: Vec::new(),
        new_people: Vec::new(),
    }
}

async fn save(storage: &dyn Storage, record: DeltaSetRecord, kind: &'static str) -> Result<DeltaSetRecord> {
    let id = storage.save_delta_set(&record).await?;
    metrics::admin::delta_set(kind);
    info!(id, name = %record.delta_set.name, kind, "Recorded person change set");
    get_delta_set(storage, id).await
}

async fn person_name(storage: &dyn Storage, person_id: &str) -> Result<String> {
    storage
        .get_people_by_ids(&[person_id.to_string()])
        .await?
        .into_iter()
        .next()
        .map(|person| person.name)
        .ok_or_else(|| AppError::not_found("Person"))
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Record that a legislator left office.
#[instrument(skip(storage, request), fields(person_id = %request.person_id))]
pub async fn retire_person(
    storage: &dyn Storage,
    request: RetirementRequest,
    created_by: &str,
) -> Result<DeltaSetRecord> {
    NaiveDate::parse_from_str(&request.date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid retirement date \"{}\"", request.date)))?;
    let name = person_name(storage, &request.person_id).await?;

    let mut record = empty_set(format!("retire {name}"), created_by);
    record.person_retirements.push(PersonRetirement {
        id: 0,
        person_id: request.person_id,
        date: request.date,
        reason: request.reason,
        is_dead: request.is_dead,
        vacant_seat: request.vacant_seat,
    });
    save(storage, record, "retirement").await
}

/// Record a legislator who is missing from the people data.
#[instrument(skip(storage, request), fields(name = %request.name))]
pub async fn propose_new_person(
    storage: &dyn Storage,
    request: NewPersonRequest,
    created_by: &str,
) -> Result<DeltaSetRecord> {
    require(&request.name, "name")?;
    require(&request.district, "district")?;
    if !CHAMBERS.contains(&request.chamber.as_str()) {
        return Err(AppError::validation(format!("Unknown chamber \"{}\"", request.chamber)));
    }
    let state = request.state.trim().to_lowercase();
    if storage.get_jurisdiction(&abbr_to_jid(&state)).await?.is_none() {
        return Err(AppError::validation(format!("Unknown state \"{}\"", request.state)));
    }

    let name = request.name.trim().to_string();
    let mut record = empty_set(format!("add {name}"), created_by);
    record.new_people.push(NewPerson {
        id: 0,
        name,
        state,
        district: request.district.trim().to_string(),
        chamber: request.chamber,
    });
    save(storage, record, "new_person").await
}

/// Record field edits to one or more existing people under one set.
#[instrument(skip(storage, deltas))]
pub async fn propose_person_changes(
    storage: &dyn Storage,
    name: &str,
    deltas: Vec<PersonDeltaRequest>,
    created_by: &str,
) -> Result<DeltaSetRecord> {
    require(name, "name")?;
    if deltas.is_empty() {
        return Err(AppError::validation("at least one person delta is required"));
    }
    let mut record = empty_set(name.trim().to_string(), created_by);
    for delta in deltas {
        if !delta.data_changes.as_object().is_some_and(|changes| !changes.is_empty()) {
            return Err(AppError::validation(format!(
                "changes for {} must be a non-empty object",
                delta.person_id
            )));
        }
        person_name(storage, &delta.person_id).await?;
        record.person_deltas.push(PersonDelta {
            id: 0,
            person_id: delta.person_id,
            data_changes: delta.data_changes,
        });
    }
    save(storage, record, "person_delta").await
}

pub async fn get_delta_set(storage: &dyn Storage, id: i64) -> Result<DeltaSetRecord> {
    storage
        .get_delta_set(id)
        .await?
        .ok_or_else(|| AppError::not_found("DeltaSet"))
}

pub async fn list_delta_sets(storage: &dyn Storage, status: Option<PullStatus>) -> Result<Vec<DeltaSet>> {
    storage.list_delta_sets(status).await
}

/// Report progress of the pull request carrying a set. Opening one needs its URL.
#[instrument(skip(storage))]
pub async fn update_pull_status(
    storage: &dyn Storage,
    id: i64,
    status: PullStatus,
    pr_url: Option<&str>,
) -> Result<DeltaSet> {
    let current = get_delta_set(storage, id).await?.delta_set;
    if !current.pr_status.can_become(status) {
        return Err(AppError::validation(format!(
            "cannot move a change set from {} to {}",
            current.pr_status, status
        )));
    }
    let pr_url = pr_url.map(str::trim).filter(|url| !url.is_empty());
    if status == PullStatus::Created && pr_url.is_none() {
        return Err(AppError::validation("pr_url is required once the pull request exists"));
    }
    storage.set_pull_status(id, status, pr_url).await?;
    info!(id, status = %status, "Updated change set pull status");
    Ok(get_delta_set(storage, id).await?.delta_set)
}
