// End-of-run reports for crawl, ping and submit runs

use crate::crawl::CrawlSummary;
use crate::error::SiteSkip;
use crate::outcome::{BroadcastResult, Outcome, Tally};
use serde::{Deserialize, Serialize};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSite {
    pub domain: String,
    pub reason: String,
}

impl SkippedSite {
    pub fn new(domain: &str, skip: &SiteSkip) -> Self {
        Self {
            domain: domain.to_string(),
            reason: skip.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlReport {
    pub sites: Vec<CrawlSummary>,
    pub skipped: Vec<SkippedSite>,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, domain: &str, result: Result<CrawlSummary, SiteSkip>) {
        match result {
            Ok(summary) => self.sites.push(summary),
            Err(skip) => self.skipped.push(SkippedSite::new(domain, &skip)),
        }
    }

    pub fn total_urls(&self) -> usize {
        self.sites.iter().map(|s| s.urls_stored).sum()
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Json => serde_json::to_string_pretty(self),
            ReportFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut report = String::new();
        report.push_str(RULE);
        report.push_str("\n\n# Crawl summary:\n");
        report.push_str(&format!("  Sites crawled: {}\n", self.sites.len()));
        report.push_str(&format!("  Sites skipped: {}\n", self.skipped.len()));
        report.push_str(&format!("  URLs stored: {}\n", self.total_urls()));
        report.push('\n');
        report.push_str(RULE);
        report.push_str("\n\n");

        for site in &self.sites {
            report.push_str(&format!("## {}\n", site.domain));
            report.push_str(&format!(
                "  {} URLs stored from {} sitemap documents\n",
                site.urls_stored, site.documents_fetched
            ));
            if site.rejected_locs > 0 {
                report.push_str(&format!(
                    "  {} non-absolute locs dropped\n",
                    site.rejected_locs
                ));
            }
            for failure in &site.failures {
                report.push_str(&format!(
                    "  ✗ {} ({} failed): {}\n",
                    failure.url,
                    failure.stage.as_str(),
                    failure.reason
                ));
            }
            report.push('\n');
        }

        push_skipped(&mut report, &self.skipped);
        report
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteBroadcast {
    pub domain: String,
    pub tally: Tally,
    pub results: Vec<BroadcastResult>,
}

/// Results of a ping or IndexNow run across all sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub title: String,
    pub sites: Vec<SiteBroadcast>,
    pub skipped: Vec<SkippedSite>,
}

impl BroadcastReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sites: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn record<E: Into<SiteSkip>>(
        &mut self,
        domain: &str,
        result: Result<Vec<BroadcastResult>, E>,
    ) {
        match result {
            Ok(results) => self.sites.push(SiteBroadcast {
                domain: domain.to_string(),
                tally: Tally::of(&results),
                results,
            }),
            Err(skip) => self.skipped.push(SkippedSite::new(domain, &skip.into())),
        }
    }

    pub fn tally(&self) -> Tally {
        self.sites.iter().fold(Tally::default(), |acc, site| Tally {
            success: acc.success + site.tally.success,
            fault: acc.fault + site.tally.fault,
            transport_error: acc.transport_error + site.tally.transport_error,
        })
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Json => serde_json::to_string_pretty(self),
            ReportFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let tally = self.tally();

        let mut report = String::new();
        report.push_str(RULE);
        report.push_str(&format!("\n\n# {} summary:\n", self.title));
        report.push_str(&format!("  Sites processed: {}\n", self.sites.len()));
        report.push_str(&format!("  Sites skipped: {}\n", self.skipped.len()));
        report.push_str(&format!("  Requests sent: {}\n", tally.total()));
        report.push_str(&format!("  Succeeded: {}\n", tally.success));
        report.push_str(&format!("  Faults: {}\n", tally.fault));
        report.push_str(&format!("  Transport errors: {}\n", tally.transport_error));
        report.push('\n');
        report.push_str(RULE);
        report.push_str("\n\n");

        for site in &self.sites {
            report.push_str(&format!("## {}\n", site.domain));
            report.push_str(&format!(
                "  {} succeeded, {} failed\n",
                site.tally.success,
                site.tally.failed()
            ));
            for result in site.results.iter().filter(|r| !r.is_success()) {
                report.push_str(&format!("  {}\n", describe_failure(result)));
            }
            report.push('\n');
        }

        push_skipped(&mut report, &self.skipped);
        report
    }
}

/// One-line description of a failed ping or submission.
pub fn describe_failure(result: &BroadcastResult) -> String {
    let status = result
        .http_status
        .map(|s| format!("HTTP {}", s))
        .unwrap_or_else(|| "no response".to_string());

    let marker = match result.outcome {
        Outcome::Fault => "⚠",
        _ => "✗",
    };

    let detail = result.detail.replace('\n', " ");
    if detail.is_empty() {
        format!("{} [{}] {} ({})", marker, result.target, result.subject, status)
    } else {
        format!(
            "{} [{}] {} ({}): {}",
            marker, result.target, result.subject, status, detail
        )
    }
}

fn push_skipped(report: &mut String, skipped: &[SkippedSite]) {
    if skipped.is_empty() {
        return;
    }
    report.push_str("## Skipped\n");
    for site in skipped {
        report.push_str(&format!("  - {}: {}\n", site.domain, site.reason));
    }
    report.push('\n');
}
