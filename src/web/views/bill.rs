use crate::constants::{ACTION_BECAME_LAW, ACTION_PASSAGE, ACTION_SIGNATURE, ACTION_VETO};
use crate::domain::{
    fix_bill_id, Bill, BillAbstract, BillAction, BillDocument, BillRecord, BillSponsorship, BillTitle,
    LegislativeSession, Link, RelatedBill, VoteCount, VoteEvent,
};
use crate::error::{AppError, Result};
use crate::jurisdictions::bill_url;
use crate::storage::Storage;
use crate::web::views::StatePage;
use std::collections::HashMap;

/// One step of a bill's progress through the legislature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub date: String,
    pub stage: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ActionRow {
    pub action: BillAction,
    pub organization: String,
}

#[derive(Debug, Clone)]
pub struct VoteSummary {
    pub vote: VoteEvent,
    pub organization: String,
    pub counts: Vec<VoteCount>,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct BillDetailContext {
    pub page_info: StatePage,
    pub bill: Bill,
    pub session: LegislativeSession,
    pub chamber: String,
    pub abstracts: Vec<BillAbstract>,
    pub other_titles: Vec<BillTitle>,
    /// Primary sponsors first
    pub sponsorships: Vec<BillSponsorship>,
    /// Newest first
    pub actions: Vec<ActionRow>,
    pub votes: Vec<VoteSummary>,
    pub versions: Vec<BillDocument>,
    pub documents: Vec<BillDocument>,
    pub sources: Vec<Link>,
    pub related_bills: Vec<RelatedBill>,
    pub read_link: Option<String>,
    pub stages: Vec<Stage>,
    pub openstates_url: String,
}

/// Link to the text most people want: the newest version, PDF when there is one.
pub fn read_link(versions: &[BillDocument]) -> Option<String> {
    let latest = versions
        .iter()
        .filter(|v| !v.links.is_empty())
        .fold(None::<&BillDocument>, |best, v| match best {
            Some(b) if b.date > v.date => Some(b),
            _ => Some(v),
        })?;
    latest
        .links
        .iter()
        .find(|l| l.media_type == "application/pdf")
        .or_else(|| latest.links.first())
        .map(|l| l.url.clone())
}

/// `Introduced`, then one stage per passage, signature, veto or enactment in action order.
pub fn bill_stages(bill: &Bill, actions: &[BillAction], org_names: &HashMap<String, String>) -> Vec<Stage> {
    let mut stages = Vec::new();
    if !bill.first_action_date.is_empty() {
        stages.push(Stage {
            date: bill.first_action_date.clone(),
            stage: "Introduced".to_string(),
            text: "Introduced".to_string(),
        });
    }

    let mut ordered: Vec<&BillAction> = actions.iter().collect();
    ordered.sort_by_key(|a| a.order);
    for action in ordered {
        let (stage, text) = if action.has_classification(ACTION_PASSAGE) {
            let org = org_names
                .get(&action.organization_id)
                .cloned()
                .unwrap_or_else(|| action.organization_id.clone());
            let text = format!("Passed {org}");
            (org, text)
        } else if action.has_classification(ACTION_SIGNATURE) {
            ("Governor".to_string(), "Signed by Governor".to_string())
        } else if action.has_classification(ACTION_VETO) {
            ("Governor".to_string(), "Vetoed by Governor".to_string())
        } else if action.has_classification(ACTION_BECAME_LAW) {
            ("Law".to_string(), "Became Law".to_string())
        } else {
            continue;
        };
        stages.push(Stage {
            date: action.date.clone(),
            stage,
            text,
        });
    }
    stages
}

/// Everything the bill page shows. `bill_id` is the URL form, e.g. `HB1`.
pub async fn bill_detail(
    storage: &dyn Storage,
    site_url: &str,
    abbr: &str,
    session: &str,
    bill_id: &str,
) -> Result<BillDetailContext> {
    let page_info = StatePage::resolve(storage, abbr).await?;
    let jid = page_info.jurisdiction.id.clone();

    let session = storage
        .get_session(&jid, session)
        .await?
        .ok_or_else(|| AppError::not_found("LegislativeSession"))?;
    let bill = storage
        .find_bill(&jid, &session.identifier, &fix_bill_id(bill_id))
        .await?
        .ok_or_else(|| AppError::not_found("Bill"))?;
    let record: BillRecord = storage
        .get_bill_records(&[bill.id.clone()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("Bill"))?;

    let org_names: HashMap<String, String> = storage
        .organizations_for_jurisdiction(&jid, None)
        .await?
        .into_iter()
        .map(|o| (o.id, o.name))
        .collect();
    let org_name = |id: &str| org_names.get(id).cloned().unwrap_or_default();

    let vote_total = storage.count_votes_for_bill(&bill.id).await?;
    let vote_events = storage.votes_for_bill(&bill.id, 0, vote_total).await?;
    let vote_ids: Vec<String> = vote_events.iter().map(|v| v.id.clone()).collect();
    let mut counts: HashMap<String, Vec<VoteCount>> = storage
        .get_vote_records(&vote_ids)
        .await?
        .into_iter()
        .map(|r| (r.vote.id, r.counts))
        .collect();
    let votes = vote_events
        .into_iter()
        .map(|vote| VoteSummary {
            organization: org_name(&vote.organization_id),
            counts: counts.remove(&vote.id).unwrap_or_default(),
            url: format!("/vote/{}/", vote.short_id()),
            vote,
        })
        .collect();

    let mut sponsorships = record.sponsorships.clone();
    sponsorships.sort_by_key(|s| !s.primary);

    let stages = bill_stages(&record.bill, &record.actions, &org_names);
    let mut actions: Vec<ActionRow> = record
        .actions
        .iter()
        .map(|a| ActionRow {
            organization: org_name(&a.organization_id),
            action: a.clone(),
        })
        .collect();
    actions.sort_by(|a, b| b.action.order.cmp(&a.action.order));

    Ok(BillDetailContext {
        chamber: org_name(&bill.from_organization_id),
        openstates_url: bill_url(site_url, &page_info.state, &session.identifier, &bill.identifier),
        read_link: read_link(&record.versions),
        stages,
        sponsorships,
        actions,
        votes,
        abstracts: record.abstracts,
        other_titles: record.other_titles,
        versions: record.versions,
        documents: record.documents,
        sources: record.sources,
        related_bills: record.related_bills,
        page_info,
        session,
        bill,
    })
}
