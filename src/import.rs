//! Load a JSON data dump into storage.
//!
//! The dump holds jurisdictions (with sessions, organizations and posts), people (with
//! memberships), bills and vote events. Bills and votes name their session by
//! jurisdiction and session identifier instead of the numeric id, which only exists
//! once the jurisdiction has been saved.

use crate::domain::{BillRecord, JurisdictionRecord, PersonRecord, VoteEventRecord};
use crate::error::{AppError, Result};
use crate::jurisdictions::{abbr_to_jid, is_jurisdiction_id};
use crate::metrics;
use crate::storage::Storage;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
pub struct BillEntry {
    /// Jurisdiction id or state abbreviation
    pub jurisdiction: String,
    pub session: String,
    #[serde(flatten)]
    pub record: BillRecord,
}

#[derive(Debug, Deserialize)]
pub struct VoteEntry {
    pub jurisdiction: String,
    pub session: String,
    #[serde(flatten)]
    pub record: VoteEventRecord,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Dump {
    pub jurisdictions: Vec<JurisdictionRecord>,
    pub people: Vec<PersonRecord>,
    pub bills: Vec<BillEntry>,
    pub votes: Vec<VoteEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub jurisdictions: usize,
    pub people: usize,
    pub bills: usize,
    pub votes: usize,
}

/// Caches session ids so each (jurisdiction, session) pair is looked up once.
struct SessionResolver<'a> {
    storage: &'a dyn Storage,
    cache: HashMap<(String, String), i64>,
}

impl<'a> SessionResolver<'a> {
    fn new(storage: &'a dyn Storage) -> Self {
        Self {
            storage,
            cache: HashMap::new(),
        }
    }

    async fn resolve(&mut self, jurisdiction: &str, session: &str) -> Result<i64> {
        let jid = if is_jurisdiction_id(jurisdiction) {
            jurisdiction.to_string()
        } else {
            abbr_to_jid(jurisdiction)
        };
        let key = (jid, session.to_string());
        if let Some(id) = self.cache.get(&key) {
            return Ok(*id);
        }
        let found = self
            .storage
            .get_session(&key.0, &key.1)
            .await?
            .ok_or_else(|| AppError::validation(format!("Unknown session {} in {}", key.1, key.0)))?;
        self.cache.insert(key, found.id);
        Ok(found.id)
    }
}

/// Save everything in `dump`, parents before children.
#[instrument(skip_all)]
pub async fn import_dump(storage: &dyn Storage, dump: Dump) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for record in &dump.jurisdictions {
        storage.save_jurisdiction(record).await?;
        summary.jurisdictions += 1;
    }
    for record in &dump.people {
        storage.save_person(record).await?;
        summary.people += 1;
    }

    let mut sessions = SessionResolver::new(storage);
    for mut entry in dump.bills {
        entry.record.bill.legislative_session_id = sessions.resolve(&entry.jurisdiction, &entry.session).await?;
        storage.save_bill(&entry.record).await?;
        summary.bills += 1;
    }
    for mut entry in dump.votes {
        entry.record.vote.legislative_session_id = sessions.resolve(&entry.jurisdiction, &entry.session).await?;
        storage.save_vote_event(&entry.record).await?;
        summary.votes += 1;
    }

    metrics::import::records("jurisdiction", summary.jurisdictions);
    metrics::import::records("person", summary.people);
    metrics::import::records("bill", summary.bills);
    metrics::import::records("vote", summary.votes);
    Ok(summary)
}

pub fn parse_dump(content: &str) -> Result<Dump> {
    Ok(serde_json::from_str(content)?)
}

/// Read a dump file from disk and import it.
pub async fn load_dump(storage: &dyn Storage, path: &Path) -> Result<ImportSummary> {
    let content = tokio::fs::read_to_string(path).await?;
    let dump = parse_dump(&content)?;
    let summary = import_dump(storage, dump).await?;
    info!(
        path = %path.display(),
        jurisdictions = summary.jurisdictions,
        people = summary.people,
        bills = summary.bills,
        votes = summary.votes,
        "Imported data dump"
    );
    Ok(summary)
}
