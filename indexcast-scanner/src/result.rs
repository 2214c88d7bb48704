use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a sitemap document was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// Nothing usable came back: bad URL, transport error, error status
    Fetch,
    /// A body arrived but was not a sitemap index or urlset
    Parse,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Fetch => "fetch",
            FailureStage::Parse => "parse",
        }
    }
}

/// A sitemap document that contributed nothing, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapFailure {
    pub url: String,
    pub stage: FailureStage,
    pub reason: String,
}

/// Everything one resolver run learned about a set of sitemap roots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resolution {
    /// Deduplicated leaf page URLs, in sorted order
    pub urls: BTreeSet<String>,
    pub documents_fetched: usize,
    pub failures: Vec<SitemapFailure>,
    /// Leaf locs dropped because they were not absolute http(s) URLs
    pub rejected_locs: usize,
}

impl Resolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, url: &str, error: &ScanError) {
        let stage = if error.is_fetch() {
            FailureStage::Fetch
        } else {
            FailureStage::Parse
        };
        self.failures.push(SitemapFailure {
            url: url.to_string(),
            stage,
            reason: error.to_string(),
        });
    }
}
