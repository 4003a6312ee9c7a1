pub mod sqlite;

use crate::domain::*;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub use sqlite::SqliteStorage;

/// Sponsorship constraints on a bill search.
#[derive(Debug, Clone, Default)]
pub struct SponsorFilter {
    pub name: Option<String>,
    pub primary: Option<bool>,
    pub person_id: Option<String>,
}

/// Progress markers a bill can have reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillStatus {
    PassedLowerChamber,
    PassedUpperChamber,
    Signed,
    BecameLaw,
    Vetoed,
}

impl BillStatus {
    pub const ALL: [BillStatus; 5] = [
        BillStatus::PassedLowerChamber,
        BillStatus::PassedUpperChamber,
        BillStatus::Signed,
        BillStatus::BecameLaw,
        BillStatus::Vetoed,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            BillStatus::PassedLowerChamber => "passed-lower-chamber",
            BillStatus::PassedUpperChamber => "passed-upper-chamber",
            BillStatus::Signed => "signed",
            BillStatus::BecameLaw => "became-law",
            BillStatus::Vetoed => "vetoed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BillStatus::PassedLowerChamber => "Passed Lower Chamber",
            BillStatus::PassedUpperChamber => "Passed Upper Chamber",
            BillStatus::Signed => "Signed",
            BillStatus::BecameLaw => "Became Law",
            BillStatus::Vetoed => "Vetoed",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.slug() == slug)
    }
}

/// Every bill filter the API and the pages support. Unset fields don't constrain.
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub jurisdiction_id: Option<String>,
    /// Session identifier, e.g. `"2018"`
    pub session: Option<String>,
    /// Classification of the originating chamber (`upper`, `lower`)
    pub chamber: Option<String>,
    pub classification: Option<String>,
    /// Every listed subject must be present
    pub subjects: Vec<String>,
    pub sponsor: Option<SponsorFilter>,
    pub updated_since: Option<DateTime<Utc>>,
    /// Partial date compared against `latest_action_date`
    pub action_since: Option<String>,
    /// Full-text search over titles and bill text
    pub search_query: Option<String>,
    /// Title substring or full-text match, as typed into the bill list search box
    pub text_query: Option<String>,
    pub identifier: Option<String>,
    pub status: Option<BillStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillSort {
    #[default]
    UpdatedDesc,
    LatestActionAsc,
    LatestActionDesc,
    FirstActionAsc,
    FirstActionDesc,
}

impl BillSort {
    /// Parse the `sort` query parameter of the bill list page.
    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "latest_action" => Some(BillSort::LatestActionAsc),
            "-latest_action" => Some(BillSort::LatestActionDesc),
            "first_action" => Some(BillSort::FirstActionAsc),
            "-first_action" => Some(BillSort::FirstActionDesc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersonFilter {
    /// Substring of the person's name
    pub name: Option<String>,
    pub jurisdiction_id: Option<String>,
    /// Organization id or name with a current membership
    pub member_of: Option<String>,
    /// Organization id or name with any membership, past or present
    pub ever_member_of: Option<String>,
    /// Post label, matched on the memberships selected above
    pub district: Option<String>,
    pub division_id: Option<String>,
}

/// Outcome of syncing the unmatched-name table for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub upserted: usize,
    pub removed: usize,
}

/// Storage trait over the relational store of legislative data
#[async_trait]
pub trait Storage: Send + Sync {
    // Write operations
    async fn save_jurisdiction(&self, record: &JurisdictionRecord) -> Result<Vec<LegislativeSession>>;
    async fn save_person(&self, record: &PersonRecord) -> Result<()>;
    async fn save_bill(&self, record: &BillRecord) -> Result<Bill>;
    async fn save_vote_event(&self, record: &VoteEventRecord) -> Result<()>;
    async fn delete_votes_for_bill(&self, bill_id: &str) -> Result<usize>;

    // Jurisdictions and sessions
    async fn get_jurisdiction(&self, id_or_name: &str) -> Result<Option<Jurisdiction>>;
    async fn list_jurisdictions(&self, classification: Option<&str>) -> Result<Vec<Jurisdiction>>;
    async fn get_jurisdictions_by_ids(&self, ids: &[String]) -> Result<Vec<Jurisdiction>>;
    async fn sessions_for_jurisdiction(&self, jurisdiction_id: &str) -> Result<Vec<LegislativeSession>>;
    async fn get_session(&self, jurisdiction_id: &str, identifier: &str) -> Result<Option<LegislativeSession>>;
    async fn get_sessions_by_ids(&self, ids: &[i64]) -> Result<Vec<LegislativeSession>>;

    // Organizations
    async fn organizations_for_jurisdiction(
        &self,
        jurisdiction_id: &str,
        classification: Option<&str>,
    ) -> Result<Vec<Organization>>;
    async fn child_organizations(&self, parent_id: &str) -> Result<Vec<Organization>>;
    async fn get_organizations_by_ids(&self, ids: &[String]) -> Result<Vec<Organization>>;

    // People
    async fn get_people_by_ids(&self, ids: &[String]) -> Result<Vec<Person>>;
    async fn count_people(&self, filter: &PersonFilter) -> Result<usize>;
    async fn search_people(&self, filter: &PersonFilter, offset: usize, limit: usize) -> Result<Vec<Person>>;
    async fn memberships_for_people(&self, person_ids: &[String]) -> Result<Vec<Membership>>;
    async fn memberships_for_organization(&self, organization_id: &str) -> Result<Vec<Membership>>;

    // Bills
    async fn get_bills_by_ids(&self, ids: &[String]) -> Result<Vec<Bill>>;
    async fn find_bill(&self, jurisdiction_id: &str, session: &str, identifier: &str) -> Result<Option<Bill>>;
    async fn count_bills(&self, filter: &BillFilter) -> Result<usize>;
    async fn search_bills(
        &self,
        filter: &BillFilter,
        sort: BillSort,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Bill>>;
    async fn get_bill_records(&self, ids: &[String]) -> Result<Vec<BillRecord>>;
    async fn bill_subjects(&self, jurisdiction_id: &str) -> Result<Vec<String>>;
    async fn bill_classifications(&self, jurisdiction_id: &str) -> Result<Vec<String>>;

    // Votes
    async fn get_vote_events_by_ids(&self, ids: &[String]) -> Result<Vec<VoteEvent>>;
    async fn get_vote_records(&self, ids: &[String]) -> Result<Vec<VoteEventRecord>>;
    async fn count_votes_for_bill(&self, bill_id: &str) -> Result<usize>;
    async fn votes_for_bill(&self, bill_id: &str, offset: usize, limit: usize) -> Result<Vec<VoteEvent>>;
    /// Votes of several bills at once, oldest first within each bill.
    async fn votes_for_bills(&self, bill_ids: &[String]) -> Result<Vec<VoteEvent>>;
    async fn count_votes_by_person(&self, person_id: &str) -> Result<usize>;
    async fn votes_by_person(&self, person_id: &str, offset: usize, limit: usize) -> Result<Vec<PersonVote>>;

    // Name reconciliation
    async fn unmatched_sponsor_names(&self, session_id: i64) -> Result<HashMap<String, i64>>;
    async fn unmatched_voter_names(&self, session_id: i64) -> Result<HashMap<String, i64>>;
    async fn list_unmatched_names(&self, session_id: i64) -> Result<Vec<UnmatchedName>>;
    async fn sync_unmatched_names(&self, session_id: i64, tallies: &[NameTally]) -> Result<SyncOutcome>;
    async fn get_unmatched_name(&self, id: i64) -> Result<Option<UnmatchedName>>;
    async fn set_unmatched_status(
        &self,
        id: i64,
        status: NameStatus,
        matched_person_id: Option<&str>,
    ) -> Result<()>;
    /// Link every unmatched sponsorship and vote carrying the name to `person_id` and
    /// mark it matched, atomically. `None` when the name does not exist.
    async fn match_unmatched_name(&self, id: i64, person_id: &str) -> Result<Option<usize>>;

    // Person change requests
    /// Store a new change set with its deltas, retirements and additions. Returns its id.
    async fn save_delta_set(&self, record: &DeltaSetRecord) -> Result<i64>;
    async fn get_delta_set(&self, id: i64) -> Result<Option<DeltaSetRecord>>;
    async fn list_delta_sets(&self, status: Option<PullStatus>) -> Result<Vec<DeltaSet>>;
    /// `false` when there is no such set.
    async fn set_pull_status(&self, id: i64, status: PullStatus, pr_url: Option<&str>) -> Result<bool>;
}
