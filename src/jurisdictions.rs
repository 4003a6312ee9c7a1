//! Open Civic Data jurisdiction ids and the public URL scheme built on them.

use crate::domain::{fix_bill_id, strip_bill_id};

/// `"ak"` -> `"ocd-jurisdiction/country:us/state:ak/government"`.
pub fn abbr_to_jid(abbr: &str) -> String {
    let abbr = abbr.to_lowercase();
    let kind = match abbr.as_str() {
        "dc" => "district",
        "pr" => "territory",
        _ => "state",
    };
    format!("ocd-jurisdiction/country:us/{kind}:{abbr}/government")
}

/// Inverse of [`abbr_to_jid`]; `None` for ids outside the US state scheme.
pub fn jid_to_abbr(jid: &str) -> Option<String> {
    let rest = jid.strip_prefix("ocd-jurisdiction/country:us/")?;
    let (segment, _) = rest.split_once('/')?;
    let (_, abbr) = segment.split_once(':')?;
    (!abbr.is_empty()).then(|| abbr.to_lowercase())
}

pub fn is_jurisdiction_id(value: &str) -> bool {
    value.starts_with("ocd-jurisdiction/")
}

/// Canonical public URL of a bill, e.g. `https://openstates.org/ak/bills/2018/HB1`.
pub fn bill_url(site_url: &str, abbr: &str, session: &str, identifier: &str) -> String {
    format!(
        "{}/{}/bills/{}/{}",
        site_url.trim_end_matches('/'),
        abbr,
        session,
        strip_bill_id(identifier)
    )
}

/// A bill reference parsed out of a public bill URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillUrlParts {
    pub jurisdiction_id: String,
    pub session: String,
    pub identifier: String,
}

/// Parse `https://<site>/<abbr>/bills/<session>/<bill_id>` back into its parts.
pub fn parse_bill_url(url: &str) -> Option<BillUrlParts> {
    let path = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let mut segments = path.trim_end_matches('/').split('/').skip(1);
    let abbr = segments.next()?;
    if segments.next()? != "bills" {
        return None;
    }
    let session = segments.next()?;
    let bill_id = segments.next()?;
    if segments.next().is_some() || abbr.is_empty() || session.is_empty() {
        return None;
    }
    Some(BillUrlParts {
        jurisdiction_id: abbr_to_jid(abbr),
        session: session.to_string(),
        identifier: fix_bill_id(bill_id),
    })
}

/// Relative path of the server-rendered bill page.
pub fn bill_page_path(abbr: &str, session: &str, identifier: &str) -> String {
    format!("/{}/bills/{}/{}/", abbr, session, strip_bill_id(identifier))
}
