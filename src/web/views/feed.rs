use crate::constants::FEED_SIZE;
use crate::domain::Bill;
use crate::error::Result;
use crate::jurisdictions::bill_url;
use crate::storage::{BillFilter, BillSort, Storage};
use crate::web::views::StatePage;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// RFC 2822, as RSS wants it
    pub pub_date: String,
}

#[derive(Debug, Clone)]
pub struct FeedContext {
    pub page_info: StatePage,
    pub title: String,
    pub link: String,
    pub last_build_date: String,
    pub items: Vec<FeedItem>,
}

/// Latest action date when it's a real day, otherwise when the bill was last touched.
fn item_date(bill: &Bill) -> DateTime<Utc> {
    bill.latest_action_date
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
        .unwrap_or(bill.updated_at)
}

/// The most recently acted-on bills in `abbr`.
pub async fn bills_feed(storage: &dyn Storage, site_url: &str, abbr: &str) -> Result<FeedContext> {
    let page_info = StatePage::resolve(storage, abbr).await?;
    let jid = page_info.jurisdiction.id.clone();

    let sessions: HashMap<i64, String> = storage
        .sessions_for_jurisdiction(&jid)
        .await?
        .into_iter()
        .map(|s| (s.id, s.identifier))
        .collect();
    let filter = BillFilter {
        jurisdiction_id: Some(jid),
        ..Default::default()
    };
    let bills = storage
        .search_bills(&filter, BillSort::LatestActionDesc, 0, FEED_SIZE)
        .await?;

    let items = bills
        .iter()
        .map(|bill| {
            let session = sessions
                .get(&bill.legislative_session_id)
                .map(String::as_str)
                .unwrap_or_default();
            FeedItem {
                title: format!("{}: {}", bill.identifier, bill.title),
                link: bill_url(site_url, &page_info.state, session, &bill.identifier),
                description: bill.latest_action_description.clone(),
                pub_date: item_date(bill).to_rfc2822(),
            }
        })
        .collect();

    Ok(FeedContext {
        title: format!("{} Bills", page_info.jurisdiction.name),
        link: format!("{}/{}/bills/", site_url.trim_end_matches('/'), page_info.state),
        last_build_date: Utc::now().to_rfc2822(),
        items,
        page_info,
    })
}
