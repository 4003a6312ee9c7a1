//! Legislative records as stored and served.
//!
//! Dates on legislative records (`start_date`, action dates, ...) are kept as the
//! partial ISO strings the sources publish (`2018`, `2018-02`, `2018-02-01`), which
//! sort correctly as text. Bookkeeping timestamps are real `DateTime<Utc>` values.

pub mod identifiers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use identifiers::{fix_bill_id, looks_like_bill_id, strip_bill_id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Division {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jurisdiction {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_jurisdiction_classification")]
    pub classification: String,
    #[serde(default)]
    pub division_id: Option<String>,
}

fn default_jurisdiction_classification() -> String {
    "state".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegislativeSession {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub jurisdiction_id: String,
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub classification: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub jurisdiction_id: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub sources: Vec<Link>,
    #[serde(default)]
    pub extras: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub organization_id: String,
    pub label: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub division_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentRole {
    pub title: String,
    pub org_classification: String,
    pub district: String,
    #[serde(default)]
    pub division_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sort_name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub primary_party: String,
    #[serde(default)]
    pub current_jurisdiction_id: Option<String>,
    #[serde(default)]
    pub current_role: Option<CurrentRole>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Post details joined onto a membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipPost {
    pub id: String,
    pub label: String,
    pub role: String,
    pub division_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub person_id: String,
    pub organization_id: String,
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default, skip_deserializing)]
    pub post: Option<MembershipPost>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

impl Membership {
    /// A membership is current when it has no end date or ends on/after `today`.
    pub fn is_current(&self, today: &str) -> bool {
        self.end_date.is_empty() || self.end_date.as_str() >= today
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    /// Filled in from the session reference when importing
    #[serde(default)]
    pub legislative_session_id: i64,
    pub identifier: String,
    pub title: String,
    pub from_organization_id: String,
    #[serde(default)]
    pub classification: Vec<String>,
    #[serde(default)]
    pub subject: Vec<String>,
    #[serde(default)]
    pub first_action_date: String,
    #[serde(default)]
    pub latest_action_date: String,
    #[serde(default)]
    pub latest_action_description: String,
    #[serde(default)]
    pub latest_passage_date: String,
    #[serde(default)]
    pub extras: serde_json::Value,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillAbstract {
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillTitle {
    pub title: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillIdentifier {
    pub identifier: String,
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub name: String,
    pub entity_type: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillAction {
    #[serde(default)]
    pub id: String,
    pub organization_id: String,
    pub description: String,
    pub date: String,
    #[serde(default)]
    pub classification: Vec<String>,
    pub order: i64,
    #[serde(default)]
    pub related_entities: Vec<RelatedEntity>,
    /// Vote event recorded against this action, filled on read
    #[serde(default, skip_deserializing)]
    pub vote_id: Option<String>,
}

impl BillAction {
    pub fn has_classification(&self, classification: &str) -> bool {
        self.classification.iter().any(|c| c == classification)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillSponsorship {
    pub name: String,
    #[serde(default = "default_entity_type")]
    pub entity_type: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub classification: String,
}

fn default_entity_type() -> String {
    "person".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub url: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub text: String,
}

/// A bill version or supporting document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillDocument {
    pub note: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub links: Vec<DocumentLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedBill {
    pub identifier: String,
    pub legislative_session: String,
    pub relation_type: String,
    #[serde(default)]
    pub related_bill_id: Option<String>,
}

/// A bill with every child collection, the unit written by `save_bill`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRecord {
    pub bill: Bill,
    #[serde(default)]
    pub abstracts: Vec<BillAbstract>,
    #[serde(default)]
    pub other_titles: Vec<BillTitle>,
    #[serde(default)]
    pub other_identifiers: Vec<BillIdentifier>,
    #[serde(default)]
    pub actions: Vec<BillAction>,
    #[serde(default)]
    pub sponsorships: Vec<BillSponsorship>,
    #[serde(default)]
    pub documents: Vec<BillDocument>,
    #[serde(default)]
    pub versions: Vec<BillDocument>,
    #[serde(default)]
    pub sources: Vec<Link>,
    #[serde(default)]
    pub related_bills: Vec<RelatedBill>,
    /// Extracted text of the latest version, indexed for search
    #[serde(default)]
    pub full_text: Option<String>,
}

impl BillRecord {
    pub fn new(bill: Bill) -> Self {
        Self {
            bill,
            abstracts: Vec::new(),
            other_titles: Vec::new(),
            other_identifiers: Vec::new(),
            actions: Vec::new(),
            sponsorships: Vec::new(),
            documents: Vec::new(),
            versions: Vec::new(),
            sources: Vec::new(),
            related_bills: Vec::new(),
            full_text: None,
        }
    }

    /// Title plus every alternate title, the text weighted first in search.
    pub fn all_titles(&self) -> String {
        std::iter::once(self.bill.title.as_str())
            .chain(self.other_titles.iter().map(|t| t.title.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteEvent {
    pub id: String,
    #[serde(default)]
    pub identifier: String,
    pub motion_text: String,
    #[serde(default)]
    pub motion_classification: Vec<String>,
    #[serde(default)]
    pub start_date: String,
    pub result: String,
    pub organization_id: String,
    #[serde(default)]
    pub legislative_session_id: i64,
    #[serde(default)]
    pub bill_id: Option<String>,
    #[serde(default)]
    pub bill_action_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl VoteEvent {
    /// The bare UUID used in page URLs (`ocd-vote/<uuid>` -> `<uuid>`).
    pub fn short_id(&self) -> &str {
        self.id.split_once('/').map(|(_, id)| id).unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteCount {
    pub option: String,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonVote {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub vote_event_id: String,
    pub option: String,
    pub voter_name: String,
    #[serde(default)]
    pub voter_id: Option<String>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteEventRecord {
    pub vote: VoteEvent,
    #[serde(default)]
    pub counts: Vec<VoteCount>,
    #[serde(default)]
    pub votes: Vec<PersonVote>,
    #[serde(default)]
    pub sources: Vec<Link>,
}

impl VoteEventRecord {
    pub fn new(vote: VoteEvent) -> Self {
        Self {
            vote,
            counts: Vec::new(),
            votes: Vec::new(),
            sources: Vec::new(),
        }
    }
}

/// A jurisdiction with the sessions, chambers and seats that belong to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JurisdictionRecord {
    pub jurisdiction: Jurisdiction,
    #[serde(default)]
    pub division: Option<Division>,
    #[serde(default)]
    pub sessions: Vec<LegislativeSession>,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub person: Person,
    #[serde(default)]
    pub memberships: Vec<Membership>,
    /// Party organizations are created on demand from these names
    #[serde(default)]
    pub party_memberships: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameStatus {
    #[serde(rename = "U")]
    Unmatched,
    #[serde(rename = "I")]
    Ignored,
    #[serde(rename = "S")]
    SourceError,
    #[serde(rename = "P")]
    MatchedPerson,
}

impl NameStatus {
    pub fn code(&self) -> &'static str {
        match self {
            NameStatus::Unmatched => "U",
            NameStatus::Ignored => "I",
            NameStatus::SourceError => "S",
            NameStatus::MatchedPerson => "P",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "U" => Some(NameStatus::Unmatched),
            "I" => Some(NameStatus::Ignored),
            "S" => Some(NameStatus::SourceError),
            "P" => Some(NameStatus::MatchedPerson),
            _ => None,
        }
    }
}

impl fmt::Display for NameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NameStatus::Unmatched => "Unmatched",
            NameStatus::Ignored => "Ignored",
            NameStatus::SourceError => "Source Error",
            NameStatus::MatchedPerson => "Matched Person",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmatchedName {
    pub id: i64,
    pub session_id: i64,
    pub name: String,
    pub sponsorships_count: i64,
    pub votes_count: i64,
    pub status: NameStatus,
    pub matched_person_id: Option<String>,
}

/// Per-name counts fed into `Storage::sync_unmatched_names`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTally {
    pub name: String,
    pub sponsorships_count: i64,
    pub votes_count: i64,
}

/// Where the pull request carrying a change set stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullStatus {
    #[serde(rename = "N")]
    NotCreated,
    #[serde(rename = "C")]
    Created,
    #[serde(rename = "M")]
    Merged,
    #[serde(rename = "R")]
    Rejected,
}

impl PullStatus {
    pub fn code(&self) -> &'static str {
        match self {
            PullStatus::NotCreated => "N",
            PullStatus::Created => "C",
            PullStatus::Merged => "M",
            PullStatus::Rejected => "R",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(PullStatus::NotCreated),
            "C" => Some(PullStatus::Created),
            "M" => Some(PullStatus::Merged),
            "R" => Some(PullStatus::Rejected),
            _ => None,
        }
    }

    /// A set moves forward once: opened, then merged or rejected.
    pub fn can_become(&self, next: PullStatus) -> bool {
        matches!(
            (self, next),
            (PullStatus::NotCreated, PullStatus::Created)
                | (PullStatus::Created, PullStatus::Merged)
                | (PullStatus::Created, PullStatus::Rejected)
        )
    }
}

impl fmt::Display for PullStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PullStatus::NotCreated => "Not Created",
            PullStatus::Created => "Created",
            PullStatus::Merged => "Merged",
            PullStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

/// A batch of requested changes to people data, published together as one pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaSet {
    pub id: i64,
    pub name: String,
    /// Empty until a pull request exists
    #[serde(default)]
    pub pr_url: String,
    pub pr_status: PullStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Field edits for one existing person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDelta {
    #[serde(default)]
    pub id: i64,
    pub person_id: String,
    pub data_changes: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRetirement {
    #[serde(default)]
    pub id: i64,
    pub person_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub is_dead: bool,
    #[serde(default)]
    pub vacant_seat: bool,
}

/// A legislator to be added to the people data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerson {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    /// State abbreviation, lowercase
    pub state: String,
    pub district: String,
    pub chamber: String,
}

/// A change set with everything it carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaSetRecord {
    pub delta_set: DeltaSet,
    #[serde(default)]
    pub person_deltas: Vec<PersonDelta>,
    #[serde(default)]
    pub person_retirements: Vec<PersonRetirement>,
    #[serde(default)]
    pub new_people: Vec<NewPerson>,
}
