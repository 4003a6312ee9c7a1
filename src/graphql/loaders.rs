use crate::domain::{
    Bill, BillRecord, Jurisdiction, LegislativeSession, Membership, Organization, Person, VoteEvent,
    VoteEventRecord,
};
use crate::storage::Storage;
use async_graphql::dataloader::{DataLoader, Loader};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// DataLoader for batching bill lookups
pub struct BillLoader {
    storage: Arc<dyn Storage>,
}

impl BillLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<String> for BillLoader {
    type Value = Bill;
    type Error = String;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let bills = self
            .storage
            .get_bills_by_ids(keys)
            .await
            .map_err(|e| e.to_string())?;
        Ok(bills.into_iter().map(|b| (b.id.clone(), b)).collect())
    }
}

/// Bills with every child collection, for the list-valued bill fields
pub struct BillRecordLoader {
    storage: Arc<dyn Storage>,
}

impl BillRecordLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<String> for BillRecordLoader {
    type Value = Arc<BillRecord>;
    type Error = String;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let records = self
            .storage
            .get_bill_records(keys)
            .await
            .map_err(|e| e.to_string())?;
        Ok(records
            .into_iter()
            .map(|r| (r.bill.id.clone(), Arc::new(r)))
            .collect())
    }
}

/// DataLoader for batching organization lookups
pub struct OrganizationLoader {
    storage: Arc<dyn Storage>,
}

impl OrganizationLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<String> for OrganizationLoader {
    type Value = Organization;
    type Error = String;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let orgs = self
            .storage
            .get_organizations_by_ids(keys)
            .await
            .map_err(|e| e.to_string())?;
        Ok(orgs.into_iter().map(|o| (o.id.clone(), o)).collect())
    }
}

/// DataLoader for batching person lookups
pub struct PersonLoader {
    storage: Arc<dyn Storage>,
}

impl PersonLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<String> for PersonLoader {
    type Value = Person;
    type Error = String;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let people = self
            .storage
            .get_people_by_ids(keys)
            .await
            .map_err(|e| e.to_string())?;
        Ok(people.into_iter().map(|p| (p.id.clone(), p)).collect())
    }
}

/// Memberships grouped by person id
pub struct MembershipLoader {
    storage: Arc<dyn Storage>,
}

impl MembershipLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<String> for MembershipLoader {
    type Value = Vec<Membership>;
    type Error = String;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let memberships = self
            .storage
            .memberships_for_people(keys)
            .await
            .map_err(|e| e.to_string())?;

        let mut map: HashMap<String, Vec<Membership>> =
            keys.iter().map(|k| (k.clone(), Vec::new())).collect();
        for membership in memberships {
            map.entry(membership.person_id.clone())
                .or_default()
                .push(membership);
        }
        Ok(map)
    }
}

/// DataLoader for batching jurisdiction lookups
pub struct JurisdictionLoader {
    storage: Arc<dyn Storage>,
}

impl JurisdictionLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<String> for JurisdictionLoader {
    type Value = Jurisdiction;
    type Error = String;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let jurisdictions = self
            .storage
            .get_jurisdictions_by_ids(keys)
            .await
            .map_err(|e| e.to_string())?;
        Ok(jurisdictions
            .into_iter()
            .map(|j| (j.id.clone(), j))
            .collect())
    }
}

/// DataLoader for batching legislative session lookups
pub struct SessionLoader {
    storage: Arc<dyn Storage>,
}

impl SessionLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<i64> for SessionLoader {
    type Value = LegislativeSession;
    type Error = String;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        let sessions = self
            .storage
            .get_sessions_by_ids(keys)
            .await
            .map_err(|e| e.to_string())?;
        Ok(sessions.into_iter().map(|s| (s.id, s)).collect())
    }
}

/// DataLoader for batching vote event lookups
pub struct VoteEventLoader {
    storage: Arc<dyn Storage>,
}

impl VoteEventLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<String> for VoteEventLoader {
    type Value = VoteEvent;
    type Error = String;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let votes = self
            .storage
            .get_vote_events_by_ids(keys)
            .await
            .map_err(|e| e.to_string())?;
        Ok(votes.into_iter().map(|v| (v.id.clone(), v)).collect())
    }
}

/// Vote events with counts, individual votes and sources
pub struct VoteRecordLoader {
    storage: Arc<dyn Storage>,
}

impl VoteRecordLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<String> for VoteRecordLoader {
    type Value = Arc<VoteEventRecord>;
    type Error = String;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let records = self
            .storage
            .get_vote_records(keys)
            .await
            .map_err(|e| e.to_string())?;
        Ok(records
            .into_iter()
            .map(|r| (r.vote.id.clone(), Arc::new(r)))
            .collect())
    }
}

/// Vote events grouped by bill id, oldest first
pub struct VotesByBillLoader {
    storage: Arc<dyn Storage>,
}

impl VotesByBillLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<String> for VotesByBillLoader {
    type Value = Vec<VoteEvent>;
    type Error = String;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let votes = self
            .storage
            .votes_for_bills(keys)
            .await
            .map_err(|e| e.to_string())?;

        let mut map: HashMap<String, Vec<VoteEvent>> =
            keys.iter().map(|k| (k.clone(), Vec::new())).collect();
        for vote in votes {
            if let Some(bill_id) = vote.bill_id.clone() {
                map.entry(bill_id).or_default().push(vote);
            }
        }
        Ok(map)
    }
}

/// Every loader the resolvers use, built once per schema.
pub struct Loaders {
    pub bills: DataLoader<BillLoader>,
    pub bill_records: DataLoader<BillRecordLoader>,
    pub organizations: DataLoader<OrganizationLoader>,
    pub people: DataLoader<PersonLoader>,
    pub memberships: DataLoader<MembershipLoader>,
    pub jurisdictions: DataLoader<JurisdictionLoader>,
    pub sessions: DataLoader<SessionLoader>,
    pub vote_events: DataLoader<VoteEventLoader>,
    pub vote_records: DataLoader<VoteRecordLoader>,
    pub votes_by_bill: DataLoader<VotesByBillLoader>,
}

impl Loaders {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            bills: BillLoader::new(storage.clone()),
            bill_records: BillRecordLoader::new(storage.clone()),
            organizations: OrganizationLoader::new(storage.clone()),
            people: PersonLoader::new(storage.clone()),
            memberships: MembershipLoader::new(storage.clone()),
            jurisdictions: JurisdictionLoader::new(storage.clone()),
            sessions: SessionLoader::new(storage.clone()),
            vote_events: VoteEventLoader::new(storage.clone()),
            vote_records: VoteRecordLoader::new(storage.clone()),
            votes_by_bill: VotesByBillLoader::new(storage),
        }
    }
}
