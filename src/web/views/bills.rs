use crate::constants::{BILLS_PER_PAGE, CHAMBER_LOWER, CHAMBER_UPPER};
use crate::domain::{fix_bill_id, looks_like_bill_id, Bill, LegislativeSession, Organization, Person};
use crate::error::{AppError, Result};
use crate::jurisdictions::bill_page_path;
use crate::storage::{BillFilter, BillSort, BillStatus, PersonFilter, Storage};
use crate::web::views::StatePage;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Query string of the bill list page. Everything is optional and kept as text so a bad
/// value can be reported as a 404 instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillListParams {
    pub query: Option<String>,
    pub chamber: Option<String>,
    pub session: Option<String>,
    pub sponsor: Option<String>,
    pub classification: Option<String>,
    pub subjects: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

/// One row of the bill list.
#[derive(Debug, Clone)]
pub struct BillSummary {
    pub bill: Bill,
    pub session: String,
    pub chamber: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub num_pages: usize,
    pub total: usize,
}

impl Pagination {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }

    pub fn previous(&self) -> usize {
        self.page.saturating_sub(1).max(1)
    }

    pub fn next(&self) -> usize {
        (self.page + 1).min(self.num_pages)
    }
}

#[derive(Debug, Clone)]
pub struct StatusOption {
    pub slug: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct BillListContext {
    pub page_info: StatePage,
    pub chambers: Vec<Organization>,
    pub sessions: Vec<LegislativeSession>,
    pub subjects: Vec<String>,
    pub sponsors: Vec<Person>,
    pub classifications: Vec<String>,
    pub statuses: Vec<StatusOption>,
    pub bills: Vec<BillSummary>,
    pub pagination: Pagination,
    pub params: BillListParams,
    /// Query string without `page`, for the pager links
    pub filter_query: String,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `None` or empty means page 1; anything else must be a positive integer.
pub fn parse_page(raw: Option<&str>) -> Result<usize> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(1),
        Some(p) => match p.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(AppError::not_found("Page")),
        },
    }
}

impl BillListParams {
    /// Translate the page's query string into a storage filter for one jurisdiction.
    pub fn to_filter(&self, jurisdiction_id: &str) -> Result<BillFilter> {
        let mut filter = BillFilter {
            jurisdiction_id: Some(jurisdiction_id.to_string()),
            chamber: non_empty(&self.chamber),
            session: non_empty(&self.session),
            classification: non_empty(&self.classification),
            subjects: non_empty(&self.subjects).into_iter().collect(),
            ..Default::default()
        };

        if let Some(sponsor) = non_empty(&self.sponsor) {
            filter.sponsor = Some(crate::storage::SponsorFilter {
                person_id: Some(sponsor),
                ..Default::default()
            });
        }

        if let Some(query) = non_empty(&self.query) {
            if looks_like_bill_id(&query) {
                filter.identifier = Some(fix_bill_id(&query));
            } else {
                filter.text_query = Some(query);
            }
        }

        if let Some(status) = non_empty(&self.status) {
            let status = BillStatus::from_slug(&status)
                .ok_or_else(|| AppError::validation(format!("Unknown bill status \"{status}\"")))?;
            filter.status = Some(status);
        }

        Ok(filter)
    }

    pub fn query_text(&self) -> &str {
        self.query.as_deref().unwrap_or_default()
    }

    /// Whether `value` is the current choice for a select box.
    pub fn is_selected(&self, field: &str, value: &str) -> bool {
        let current = match field {
            "chamber" => &self.chamber,
            "session" => &self.session,
            "sponsor" => &self.sponsor,
            "classification" => &self.classification,
            "subjects" => &self.subjects,
            "status" => &self.status,
            "sort" => &self.sort,
            _ => return false,
        };
        current.as_deref() == Some(value)
    }

    pub fn sort(&self) -> BillSort {
        self.sort
            .as_deref()
            .and_then(BillSort::from_param)
            .unwrap_or(BillSort::LatestActionDesc)
    }

    fn filter_query(&self) -> String {
        let pairs = [
            ("query", &self.query),
            ("chamber", &self.chamber),
            ("session", &self.session),
            ("sponsor", &self.sponsor),
            ("classification", &self.classification),
            ("subjects", &self.subjects),
            ("status", &self.status),
            ("sort", &self.sort),
        ];
        pairs
            .iter()
            .filter_map(|(key, value)| non_empty(value).map(|v| format!("{key}={}", urlencoding::encode(&v))))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Everything the bill list page shows for `abbr`.
pub async fn bill_list(storage: &dyn Storage, abbr: &str, params: BillListParams) -> Result<BillListContext> {
    let page_info = StatePage::resolve(storage, abbr).await?;
    let jid = page_info.jurisdiction.id.clone();
    let page = parse_page(params.page.as_deref())?;

    let organizations = storage.organizations_for_jurisdiction(&jid, None).await?;
    let chambers: Vec<Organization> = organizations
        .iter()
        .filter(|o| o.classification == CHAMBER_UPPER || o.classification == CHAMBER_LOWER)
        .cloned()
        .collect();
    let chamber_by_org: HashMap<&str, &str> = organizations
        .iter()
        .map(|o| (o.id.as_str(), o.classification.as_str()))
        .collect();

    let sessions = storage.sessions_for_jurisdiction(&jid).await?;
    let session_by_id: HashMap<i64, &str> = sessions
        .iter()
        .map(|s| (s.id, s.identifier.as_str()))
        .collect();

    let subjects = storage.bill_subjects(&jid).await?;
    let classifications = storage.bill_classifications(&jid).await?;

    let sponsor_filter = PersonFilter {
        jurisdiction_id: Some(jid.clone()),
        ..Default::default()
    };
    let sponsor_count = storage.count_people(&sponsor_filter).await?;
    let sponsors = storage.search_people(&sponsor_filter, 0, sponsor_count).await?;

    let filter = params.to_filter(&jid)?;
    let total = storage.count_bills(&filter).await?;
    let num_pages = total.div_ceil(BILLS_PER_PAGE).max(1);
    if page > num_pages {
        return Err(AppError::not_found("Page"));
    }
    let bills = storage
        .search_bills(&filter, params.sort(), (page - 1) * BILLS_PER_PAGE, BILLS_PER_PAGE)
        .await?;
    debug!(state = abbr, total, page, "bill list");

    let bills = bills
        .into_iter()
        .map(|bill| {
            let session = session_by_id
                .get(&bill.legislative_session_id)
                .copied()
                .unwrap_or_default()
                .to_string();
            let chamber = chamber_by_org
                .get(bill.from_organization_id.as_str())
                .copied()
                .unwrap_or_default()
                .to_string();
            let url = bill_page_path(abbr, &session, &bill.identifier);
            BillSummary { bill, session, chamber, url }
        })
        .collect();

    Ok(BillListContext {
        page_info,
        chambers,
        sessions,
        subjects,
        sponsors,
        classifications,
        statuses: BillStatus::ALL
            .iter()
            .map(|s| StatusOption { slug: s.slug(), label: s.label() })
            .collect(),
        bills,
        pagination: Pagination { page, num_pages, total },
        filter_query: params.filter_query(),
        params,
    })
}
