//! SQLite implementation of [`Storage`].
//!
//! One connection behind a mutex. Every trait method runs a synchronous closure
//! against the connection so the guard is never held across an `.await`.

mod bills;
mod deltas;
mod jurisdictions;
mod names;
mod people;
mod rows;
mod votes;

use super::{BillFilter, BillSort, PersonFilter, Storage, SyncOutcome};
use crate::domain::*;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

const SCHEMA: &str = include_str!("sqlite/schema.sql");

pub struct SqliteStorage {
    conn: Mutex<Connection>,
    calls: AtomicUsize,
}

impl SqliteStorage {
    /// Open (creating if needed) the database file and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        info!(path = %path.display(), "Opened SQLite database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        debug!("Database schema is up to date");
        Ok(Self {
            conn: Mutex::new(conn),
            calls: AtomicUsize::new(0),
        })
    }

    /// Storage calls served since open. Each call is one unit of database work.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut conn = self.conn.lock().map_err(|_| AppError::Storage {
            message: "database connection lock poisoned".to_string(),
        })?;
        f(&mut conn)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save_jurisdiction(&self, record: &JurisdictionRecord) -> Result<Vec<LegislativeSession>> {
        self.with_conn(|c| jurisdictions::save_jurisdiction(c, record))
    }

    async fn save_person(&self, record: &PersonRecord) -> Result<()> {
        self.with_conn(|c| people::save_person(c, record))
    }

    async fn save_bill(&self, record: &BillRecord) -> Result<Bill> {
        self.with_conn(|c| bills::save_bill(c, record))
    }

    async fn save_vote_event(&self, record: &VoteEventRecord) -> Result<()> {
        self.with_conn(|c| votes::save_vote_event(c, record))
    }

    async fn delete_votes_for_bill(&self, bill_id: &str) -> Result<usize> {
        self.with_conn(|c| votes::delete_votes_for_bill(c, bill_id))
    }

    async fn get_jurisdiction(&self, id_or_name: &str) -> Result<Option<Jurisdiction>> {
        self.with_conn(|c| jurisdictions::get_jurisdiction(c, id_or_name))
    }

    async fn list_jurisdictions(&self, classification: Option<&str>) -> Result<Vec<Jurisdiction>> {
        self.with_conn(|c| jurisdictions::list_jurisdictions(c, classification))
    }

    async fn get_jurisdictions_by_ids(&self, ids: &[String]) -> Result<Vec<Jurisdiction>> {
        self.with_conn(|c| jurisdictions::get_jurisdictions_by_ids(c, ids))
    }

    async fn sessions_for_jurisdiction(&self, jurisdiction_id: &str) -> Result<Vec<LegislativeSession>> {
        self.with_conn(|c| jurisdictions::sessions_for_jurisdiction(c, jurisdiction_id))
    }

    async fn get_session(&self, jurisdiction_id: &str, identifier: &str) -> Result<Option<LegislativeSession>> {
        self.with_conn(|c| jurisdictions::get_session(c, jurisdiction_id, identifier))
    }

    async fn get_sessions_by_ids(&self, ids: &[i64]) -> Result<Vec<LegislativeSession>> {
        self.with_conn(|c| jurisdictions::get_sessions_by_ids(c, ids))
    }

    async fn organizations_for_jurisdiction(
        &self,
        jurisdiction_id: &str,
        classification: Option<&str>,
    ) -> Result<Vec<Organization>> {
        self.with_conn(|c| jurisdictions::organizations_for_jurisdiction(c, jurisdiction_id, classification))
    }

    async fn child_organizations(&self, parent_id: &str) -> Result<Vec<Organization>> {
        self.with_conn(|c| jurisdictions::child_organizations(c, parent_id))
    }

    async fn get_organizations_by_ids(&self, ids: &[String]) -> Result<Vec<Organization>> {
        self.with_conn(|c| jurisdictions::get_organizations_by_ids(c, ids))
    }

    async fn get_people_by_ids(&self, ids: &[String]) -> Result<Vec<Person>> {
        self.with_conn(|c| people::get_people_by_ids(c, ids))
    }

    async fn count_people(&self, filter: &PersonFilter) -> Result<usize> {
        self.with_conn(|c| people::count_people(c, filter))
    }

    async fn search_people(&self, filter: &PersonFilter, offset: usize, limit: usize) -> Result<Vec<Person>> {
        self.with_conn(|c| people::search_people(c, filter, offset, limit))
    }

    async fn memberships_for_people(&self, person_ids: &[String]) -> Result<Vec<Membership>> {
        self.with_conn(|c| people::memberships_for_people(c, person_ids))
    }

    async fn memberships_for_organization(&self, organization_id: &str) -> Result<Vec<Membership>> {
        self.with_conn(|c| people::memberships_for_organization(c, organization_id))
    }

    async fn get_bills_by_ids(&self, ids: &[String]) -> Result<Vec<Bill>> {
        self.with_conn(|c| bills::get_bills_by_ids(c, ids))
    }

    async fn find_bill(&self, jurisdiction_id: &str, session: &str, identifier: &str) -> Result<Option<Bill>> {
        self.with_conn(|c| bills::find_bill(c, jurisdiction_id, session, identifier))
    }

    async fn count_bills(&self, filter: &BillFilter) -> Result<usize> {
        self.with_conn(|c| bills::count_bills(c, filter))
    }

    async fn search_bills(
        &self,
        filter: &BillFilter,
        sort: BillSort,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Bill>> {
        self.with_conn(|c| bills::search_bills(c, filter, sort, offset, limit))
    }

    async fn get_bill_records(&self, ids: &[String]) -> Result<Vec<BillRecord>> {
        self.with_conn(|c| bills::get_bill_records(c, ids))
    }

    async fn bill_subjects(&self, jurisdiction_id: &str) -> Result<Vec<String>> {
        self.with_conn(|c| bills::distinct_json_values(c, jurisdiction_id, "subject"))
    }

    async fn bill_classifications(&self, jurisdiction_id: &str) -> Result<Vec<String>> {
        self.with_conn(|c| bills::distinct_json_values(c, jurisdiction_id, "classification"))
    }

    async fn get_vote_events_by_ids(&self, ids: &[String]) -> Result<Vec<VoteEvent>> {
        self.with_conn(|c| votes::get_vote_events_by_ids(c, ids))
    }

    async fn get_vote_records(&self, ids: &[String]) -> Result<Vec<VoteEventRecord>> {
        self.with_conn(|c| votes::get_vote_records(c, ids))
    }

    async fn count_votes_for_bill(&self, bill_id: &str) -> Result<usize> {
        self.with_conn(|c| votes::count_votes_for_bill(c, bill_id))
    }

    async fn votes_for_bill(&self, bill_id: &str, offset: usize, limit: usize) -> Result<Vec<VoteEvent>> {
        self.with_conn(|c| votes::votes_for_bill(c, bill_id, offset, limit))
    }

    async fn votes_for_bills(&self, bill_ids: &[String]) -> Result<Vec<VoteEvent>> {
        self.with_conn(|c| votes::votes_for_bills(c, bill_ids))
    }

    async fn count_votes_by_person(&self, person_id: &str) -> Result<usize> {
        self.with_conn(|c| votes::count_votes_by_person(c, person_id))
    }

    async fn votes_by_person(&self, person_id: &str, offset: usize, limit: usize) -> Result<Vec<PersonVote>> {
        self.with_conn(|c| votes::votes_by_person(c, person_id, offset, limit))
    }

    async fn unmatched_sponsor_names(&self, session_id: i64) -> Result<HashMap<String, i64>> {
        self.with_conn(|c| names::unmatched_sponsor_names(c, session_id))
    }

    async fn unmatched_voter_names(&self, session_id: i64) -> Result<HashMap<String, i64>> {
        self.with_conn(|c| names::unmatched_voter_names(c, session_id))
    }

    async fn list_unmatched_names(&self, session_id: i64) -> Result<Vec<UnmatchedName>> {
        self.with_conn(|c| names::list_unmatched_names(c, session_id))
    }

    async fn sync_unmatched_names(&self, session_id: i64, tallies: &[NameTally]) -> Result<SyncOutcome> {
        self.with_conn(|c| names::sync_unmatched_names(c, session_id, tallies))
    }

    async fn get_unmatched_name(&self, id: i64) -> Result<Option<UnmatchedName>> {
        self.with_conn(|c| names::get_unmatched_name(c, id))
    }

    async fn set_unmatched_status(
        &self,
        id: i64,
        status: NameStatus,
        matched_person_id: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|c| names::set_unmatched_status(c, id, status, matched_person_id))
    }

    async fn match_unmatched_name(&self, id: i64, person_id: &str) -> Result<Option<usize>> {
        self.with_conn(|c| names::match_unmatched_name(c, id, person_id))
    }

    async fn save_delta_set(&self, record: &DeltaSetRecord) -> Result<i64> {
        self.with_conn(|c| deltas::save_delta_set(c, record))
    }

    async fn get_delta_set(&self, id: i64) -> Result<Option<DeltaSetRecord>> {
        self.with_conn(|c| deltas::get_delta_set(c, id))
    }

    async fn list_delta_sets(&self, status: Option<PullStatus>) -> Result<Vec<DeltaSet>> {
        self.with_conn(|c| deltas::list_delta_sets(c, status))
    }

    async fn set_pull_status(&self, id: i64, status: PullStatus, pr_url: Option<&str>) -> Result<bool> {
        self.with_conn(|c| deltas::set_pull_status(c, id, status, pr_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_applies_twice() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .with_conn(|c| {
                c.execute_batch(SCHEMA)?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn opens_file_database_in_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("openstates.db");
        SqliteStorage::open(&path).unwrap();
        assert!(path.exists());
    }
}
