use crate::constants::UNKNOWN_PARTY;
use crate::domain::{Bill, LegislativeSession, PersonVote, VoteCount, VoteEvent};
use crate::error::{AppError, Result};
use crate::jurisdictions::{bill_page_path, jid_to_abbr};
use crate::storage::Storage;
use crate::web::views::StatePage;
use std::collections::{BTreeMap, HashMap};

/// Vote tallies for one party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyVotes {
    pub party: String,
    /// Always carries `yes` and `no`
    pub counts: BTreeMap<String, i64>,
}

impl PartyVotes {
    pub fn count(&self, option: &str) -> i64 {
        self.counts.get(option).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct VoteDetailContext {
    pub page_info: StatePage,
    pub vote: VoteEvent,
    pub session: LegislativeSession,
    pub organization: String,
    pub bill: Option<Bill>,
    pub bill_url: Option<String>,
    /// `yes`, `no`, then everything else in stored order
    pub vote_counts: Vec<VoteCount>,
    /// Sorted by voter name
    pub person_votes: Vec<PersonVote>,
    /// Sorted by party name
    pub party_votes: Vec<PartyVotes>,
}

fn count_rank(option: &str) -> u8 {
    match option {
        "yes" => 0,
        "no" => 1,
        _ => 2,
    }
}

pub fn order_counts(mut counts: Vec<VoteCount>) -> Vec<VoteCount> {
    counts.sort_by_key(|c| count_rank(&c.option));
    counts
}

/// Group person votes by the voter's party; unmatched voters count as `Unknown`.
pub fn party_breakdown(votes: &[PersonVote], parties: &HashMap<String, String>) -> Vec<PartyVotes> {
    let mut by_party: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
    for vote in votes {
        let party = vote
            .voter_id
            .as_ref()
            .and_then(|id| parties.get(id))
            .filter(|p| !p.is_empty())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_PARTY.to_string());
        let counts = by_party.entry(party).or_insert_with(|| {
            [("yes".to_string(), 0), ("no".to_string(), 0)]
                .into_iter()
                .collect()
        });
        *counts.entry(vote.option.clone()).or_insert(0) += 1;
    }
    by_party
        .into_iter()
        .map(|(party, counts)| PartyVotes { party, counts })
        .collect()
}

/// Everything the vote page shows. `vote_id` is the bare UUID from the URL.
pub async fn vote_detail(storage: &dyn Storage, vote_id: &str) -> Result<VoteDetailContext> {
    let full_id = format!("ocd-vote/{vote_id}");
    let record = storage
        .get_vote_records(&[full_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("VoteEvent"))?;

    let session = storage
        .get_sessions_by_ids(&[record.vote.legislative_session_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("LegislativeSession"))?;
    let abbr = jid_to_abbr(&session.jurisdiction_id).ok_or_else(|| AppError::not_found("Jurisdiction"))?;
    let page_info = StatePage::resolve(storage, &abbr).await?;

    let organization = storage
        .get_organizations_by_ids(&[record.vote.organization_id.clone()])
        .await?
        .into_iter()
        .next()
        .map(|o| o.name)
        .unwrap_or_default();

    let bill = match &record.vote.bill_id {
        Some(id) => storage.get_bills_by_ids(&[id.clone()]).await?.into_iter().next(),
        None => None,
    };
    let bill_url = bill
        .as_ref()
        .map(|b| bill_page_path(&abbr, &session.identifier, &b.identifier));

    let voter_ids: Vec<String> = record.votes.iter().filter_map(|v| v.voter_id.clone()).collect();
    let parties: HashMap<String, String> = storage
        .get_people_by_ids(&voter_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.primary_party))
        .collect();

    let mut person_votes = record.votes;
    person_votes.sort_by(|a, b| a.voter_name.cmp(&b.voter_name));
    let party_votes = party_breakdown(&person_votes, &parties);

    Ok(VoteDetailContext {
        page_info,
        vote: record.vote,
        session,
        organization,
        bill,
        bill_url,
        vote_counts: order_counts(record.counts),
        person_votes,
        party_votes,
    })
}
