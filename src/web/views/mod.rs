//! Page contexts, built straight from storage so they can be tested without HTTP.

pub mod bill;
pub mod bills;
pub mod feed;
pub mod vote;

use crate::domain::Jurisdiction;
use crate::error::{AppError, Result};
use crate::jurisdictions::abbr_to_jid;
use crate::storage::Storage;

/// The state a page belongs to and which navigation tab it highlights.
#[derive(Debug, Clone)]
pub struct StatePage {
    pub state: String,
    pub state_nav: &'static str,
    pub jurisdiction: Jurisdiction,
}

impl StatePage {
    pub async fn resolve(storage: &dyn Storage, abbr: &str) -> Result<Self> {
        let abbr = abbr.to_lowercase();
        if abbr.is_empty() || !abbr.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(AppError::not_found("Jurisdiction"));
        }
        let jurisdiction = storage
            .get_jurisdiction(&abbr_to_jid(&abbr))
            .await?
            .ok_or_else(|| AppError::not_found("Jurisdiction"))?;
        Ok(Self {
            state: abbr,
            state_nav: "bills",
            jurisdiction,
        })
    }
}
