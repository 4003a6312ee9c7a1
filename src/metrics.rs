//! Prometheus metrics for the API, the pages and the admin tooling.
//!
//! Names come from [`MetricName`] so call sites never spell metric strings by hand.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::OnceLock;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    GraphqlRequests,
    GraphqlErrors,
    GraphqlDuration,
    PageViews,
    PageNotFound,
    UnmatchedSyncRuns,
    UnmatchedNames,
    ImportRecords,
    DeltaSets,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::GraphqlRequests => "openstates_graphql_requests_total",
            MetricName::GraphqlErrors => "openstates_graphql_errors_total",
            MetricName::GraphqlDuration => "openstates_graphql_duration_seconds",
            MetricName::PageViews => "openstates_page_views_total",
            MetricName::PageNotFound => "openstates_page_not_found_total",
            MetricName::UnmatchedSyncRuns => "openstates_unmatched_sync_runs_total",
            MetricName::UnmatchedNames => "openstates_unmatched_names",
            MetricName::ImportRecords => "openstates_import_records_total",
            MetricName::DeltaSets => "openstates_people_delta_sets_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init() -> Result<(), String> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics recorder installed");
    Ok(())
}

/// Render the current metrics in Prometheus text format.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod graphql {
    use super::MetricName;

    pub fn request(duration_secs: f64, had_errors: bool) {
        ::metrics::counter!(MetricName::GraphqlRequests.as_str()).increment(1);
        ::metrics::histogram!(MetricName::GraphqlDuration.as_str()).record(duration_secs);
        if had_errors {
            ::metrics::counter!(MetricName::GraphqlErrors.as_str()).increment(1);
        }
    }
}

pub mod pages {
    use super::MetricName;

    pub fn view(page: &'static str) {
        ::metrics::counter!(MetricName::PageViews.as_str(), "page" => page).increment(1);
    }

    pub fn not_found(page: &'static str) {
        ::metrics::counter!(MetricName::PageNotFound.as_str(), "page" => page).increment(1);
    }
}

pub mod admin {
    use super::MetricName;

    pub fn unmatched_sync(state: &str, names: usize) {
        ::metrics::counter!(MetricName::UnmatchedSyncRuns.as_str(), "state" => state.to_string())
            .increment(1);
        ::metrics::gauge!(MetricName::UnmatchedNames.as_str(), "state" => state.to_string())
            .set(names as f64);
    }

    pub fn delta_set(kind: &'static str) {
        ::metrics::counter!(MetricName::DeltaSets.as_str(), "kind" => kind).increment(1);
    }
}

pub mod import {
    use super::MetricName;

    pub fn records(kind: &'static str, count: usize) {
        ::metrics::counter!(MetricName::ImportRecords.as_str(), "kind" => kind)
            .increment(count as u64);
    }
}
