use crate::error::{Result, ScanError};
use crate::node::SitemapNode;
use crate::result::Resolution;
use reqwest::Client;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const USER_AGENT: &str = concat!("indexcast/", env!("CARGO_PKG_VERSION"));

/// Called with each sitemap URL right before it is fetched.
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Walks sitemap indexes down to their urlset leaves.
///
/// Every fetch is isolated: a timeout, an error status or an unreadable
/// document drops that one node and the walk carries on with its siblings.
pub struct SitemapResolver {
    client: Client,
    progress_callback: Option<ProgressCallback>,
}

impl SitemapResolver {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Resolve sitemap roots to the deduplicated set of page URLs they list.
    pub async fn resolve(&self, roots: &[String]) -> BTreeSet<String> {
        self.resolve_detailed(roots).await.urls
    }

    /// Like [`resolve`](Self::resolve), but also reports fetch counts and per-node failures.
    pub async fn resolve_detailed(&self, roots: &[String]) -> Resolution {
        let mut resolution = Resolution::new();
        // Shared by every root so a cycle, or two roots sharing a child, fetch once
        let mut visited: HashSet<String> = HashSet::new();
        // Reversed so the first root (and first child) is walked first
        let mut pending: Vec<String> = roots.iter().rev().cloned().collect();

        while let Some(sitemap_url) = pending.pop() {
            if !visited.insert(sitemap_url.clone()) {
                debug!(url = %sitemap_url, "Sitemap already visited, skipping");
                continue;
            }

            if let Some(ref callback) = self.progress_callback {
                callback(&sitemap_url);
            }

            let body = match self.fetch(&sitemap_url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %sitemap_url, error = %e, "Failed to fetch sitemap");
                    resolution.record_failure(&sitemap_url, &e);
                    continue;
                }
            };
            resolution.documents_fetched += 1;

            match SitemapNode::parse(&body) {
                SitemapNode::Index(children) => {
                    debug!(url = %sitemap_url, children = children.len(), "Sitemap index");
                    for child in children.into_iter().rev() {
                        if !visited.contains(&child) {
                            pending.push(child);
                        }
                    }
                }
                SitemapNode::UrlSet(locs) => {
                    debug!(url = %sitemap_url, locs = locs.len(), "Sitemap urlset");
                    for loc in locs {
                        if is_page_url(&loc) {
                            resolution.urls.insert(loc);
                        } else {
                            debug!(url = %sitemap_url, loc = %loc, "Dropping non-absolute loc");
                            resolution.rejected_locs += 1;
                        }
                    }
                }
                SitemapNode::Malformed => {
                    let e = ScanError::ParseError("not a sitemap index or urlset".to_string());
                    warn!(url = %sitemap_url, error = %e, "Failed to parse sitemap");
                    resolution.record_failure(&sitemap_url, &e);
                }
            }
        }

        info!(
            roots = roots.len(),
            documents = resolution.documents_fetched,
            failures = resolution.failures.len(),
            "Resolved {} URLs",
            resolution.urls.len()
        );
        resolution
    }

    async fn fetch(&self, sitemap_url: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(sitemap_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", sitemap_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{}: unsupported scheme",
                sitemap_url
            )));
        }

        debug!("Fetching {}", sitemap_url);
        let response = self.client.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::HttpStatus(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// True for absolute http(s) URLs with a host, the only strings allowed in a URL set.
///
/// The string is checked as written, not just as `Url::parse` would repair it:
/// `http:foo`, `https:/a.com`, backslashes and embedded whitespace are rejected.
pub fn is_page_url(candidate: &str) -> bool {
    let Some(rest) = ["http://", "https://"].iter().find_map(|prefix| {
        candidate
            .get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .map(|_| &candidate[prefix.len()..])
    }) else {
        return false;
    };

    if rest.starts_with('/')
        || candidate
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '\\')
    {
        return false;
    }

    Url::parse(candidate)
        .map(|u| u.host_str().is_some_and(|host| !host.is_empty()))
        .unwrap_or(false)
}
