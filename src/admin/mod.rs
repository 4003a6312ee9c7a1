//! Reconciliation of sponsor and voter names that could not be linked to a person.
//!
//! Scrapers record names as printed in the source. Names that no importer could resolve
//! are tallied per session into `UnmatchedName` rows so staff can match, ignore or flag
//! them.

pub mod changes;
pub mod handlers;

use crate::domain::{LegislativeSession, NameStatus, NameTally, UnmatchedName};
use crate::error::{AppError, Result};
use crate::jurisdictions::{abbr_to_jid, is_jurisdiction_id};
use crate::metrics;
use crate::storage::{Storage, SyncOutcome};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};

/// Look up a session by state abbreviation (or jurisdiction id) and session identifier.
pub async fn find_session(storage: &dyn Storage, state: &str, session: &str) -> Result<LegislativeSession> {
    let jid = if is_jurisdiction_id(state) {
        state.to_string()
    } else {
        abbr_to_jid(state)
    };
    storage
        .get_session(&jid, session)
        .await?
        .ok_or_else(|| AppError::not_found("LegislativeSession"))
}

/// Person sponsorships in `session` with no linked person, counted by name.
pub async fn check_sponsorships(storage: &dyn Storage, session: &LegislativeSession) -> Result<HashMap<String, i64>> {
    storage.unmatched_sponsor_names(session.id).await
}

/// Person votes in `session` with no linked voter, counted by name.
pub async fn check_votes(storage: &dyn Storage, session: &LegislativeSession) -> Result<HashMap<String, i64>> {
    storage.unmatched_voter_names(session.id).await
}

/// Combine both tallies into one row per name; the missing side counts as zero.
pub fn merge_tallies(sponsorships: HashMap<String, i64>, votes: HashMap<String, i64>) -> Vec<NameTally> {
    let mut merged: BTreeMap<String, NameTally> = BTreeMap::new();
    for (name, count) in sponsorships {
        merged
            .entry(name.clone())
            .or_insert_with(|| NameTally {
                name,
                sponsorships_count: 0,
                votes_count: 0,
            })
            .sponsorships_count = count;
    }
    for (name, count) in votes {
        merged
            .entry(name.clone())
            .or_insert_with(|| NameTally {
                name,
                sponsorships_count: 0,
                votes_count: 0,
            })
            .votes_count = count;
    }
    merged.into_values().collect()
}

/// Refresh the unmatched names of one session.
///
/// Existing rows keep their status and get new counts, new names start out unmatched,
/// and names that no longer appear anywhere are removed. Running it twice is a no-op.
#[instrument(skip(storage))]
pub async fn update_unmatched(storage: &dyn Storage, state: &str, session: &str) -> Result<SyncOutcome> {
    let session = find_session(storage, state, session).await?;
    let sponsorships = check_sponsorships(storage, &session).await?;
    let votes = check_votes(storage, &session).await?;
    let tallies = merge_tallies(sponsorships, votes);

    let outcome = storage.sync_unmatched_names(session.id, &tallies).await?;
    metrics::admin::unmatched_sync(state, tallies.len());
    info!(
        session = %session.identifier,
        names = tallies.len(),
        upserted = outcome.upserted,
        removed = outcome.removed,
        "Updated unmatched names"
    );
    Ok(outcome)
}

pub async fn unmatched_names(storage: &dyn Storage, state: &str, session: &str) -> Result<Vec<UnmatchedName>> {
    let session = find_session(storage, state, session).await?;
    storage.list_unmatched_names(session.id).await
}

/// Mark a name ignored, a source error, or unmatched again. Matching goes through
/// [`apply_match`] so the person link is recorded.
pub async fn set_status(storage: &dyn Storage, id: i64, status: NameStatus) -> Result<UnmatchedName> {
    if status == NameStatus::MatchedPerson {
        return Err(AppError::validation("use the match endpoint to match a name to a person"));
    }
    storage
        .get_unmatched_name(id)
        .await?
        .ok_or_else(|| AppError::not_found("UnmatchedName"))?;
    storage.set_unmatched_status(id, status, None).await?;
    storage
        .get_unmatched_name(id)
        .await?
        .ok_or_else(|| AppError::not_found("UnmatchedName"))
}

/// Link every unmatched sponsorship and vote carrying the name to `person_id` and mark
/// the name matched. Returns how many records were linked.
#[instrument(skip(storage))]
pub async fn apply_match(storage: &dyn Storage, id: i64, person_id: &str) -> Result<usize> {
    let name = storage
        .get_unmatched_name(id)
        .await?
        .ok_or_else(|| AppError::not_found("UnmatchedName"))?;
    if storage
        .get_people_by_ids(&[person_id.to_string()])
        .await?
        .is_empty()
    {
        return Err(AppError::not_found("Person"));
    }

    let linked = storage
        .match_unmatched_name(id, person_id)
        .await?
        .ok_or_else(|| AppError::not_found("UnmatchedName"))?;
    info!(name = %name.name, linked, "Matched name to person");
    Ok(linked)
}
