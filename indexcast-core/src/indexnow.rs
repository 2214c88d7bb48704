// IndexNow submissions, one GET per (url, engine) pair

use crate::cache::{BlobStore, UrlCache};
use crate::error::SiteSkip;
use crate::outcome::{BroadcastResult, ResultCallback, SubmitResult};
use crate::site::SiteConfig;
use futures::stream::{self, StreamExt};
use indexcast_scanner::is_page_url;
use indexcast_scanner::resolver::{DEFAULT_TIMEOUT_SECS, USER_AGENT};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Search engines accepting IndexNow GET submissions: (name, endpoint).
pub const INDEXNOW_ENGINES: [(&str, &str); 6] = [
    ("IndexNow Official", "https://api.indexnow.org/indexnow"),
    ("Bing", "https://www.bing.com/indexnow"),
    ("Yandex", "https://yandex.com/indexnow"),
    ("Naver", "https://searchadvisor.naver.com/indexnow"),
    ("Seznam", "https://search.seznam.cz/indexnow"),
    ("Yep", "https://indexnow.yep.com/indexnow"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    pub name: String,
    pub endpoint: String,
}

impl Engine {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

pub fn default_engines() -> Vec<Engine> {
    INDEXNOW_ENGINES
        .iter()
        .map(|(name, endpoint)| Engine::new(*name, *endpoint))
        .collect()
}

/// The cached entries worth submitting: absolute http(s) URLs, first occurrence kept.
pub fn submission_set(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| is_page_url(u))
        .filter(|u| seen.insert(*u))
        .map(str::to_string)
        .collect()
}

/// `endpoint?url=<url>&key=<key>`, query-encoded.
pub fn submission_url(endpoint: &str, url: &str, key: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(endpoint, &[("url", url), ("key", key)])
}

pub struct IndexNowBroadcaster {
    client: Client,
    engines: Vec<Engine>,
    concurrency: usize,
    result_callback: Option<ResultCallback>,
}

impl IndexNowBroadcaster {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            engines: default_engines(),
            concurrency: 1,
            result_callback: None,
        }
    }

    pub fn with_engines(mut self, engines: Vec<Engine>) -> Self {
        self.engines = engines;
        self
    }

    /// Requests kept in flight at once. Results keep (url, engine) order either way.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    /// Submit every valid URL to every engine.
    pub async fn broadcast(
        &self,
        site: &SiteConfig,
        urls: &[String],
    ) -> Result<Vec<SubmitResult>, SiteSkip> {
        let key = site.indexnow_key()?;

        let valid = submission_set(urls);
        if valid.is_empty() {
            return Err(SiteSkip::NoValidUrls {
                domain: site.domain.clone(),
            });
        }

        info!(
            domain = %site.domain,
            urls = valid.len(),
            engines = self.engines.len(),
            "Submitting to IndexNow"
        );

        let pairs = valid
            .iter()
            .flat_map(|url| self.engines.iter().map(move |engine| (url, engine)));

        let results = stream::iter(pairs)
            .map(|(url, engine)| async move {
                let result = self.submit(engine, url, key).await;
                if let Some(ref callback) = self.result_callback {
                    callback(&result);
                }
                result
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(results)
    }

    /// One GET submission. Failures come back as results, never as errors.
    pub async fn submit(&self, engine: &Engine, url: &str, key: &str) -> SubmitResult {
        let request_url = match submission_url(&engine.endpoint, url, key) {
            Ok(u) => u,
            Err(e) => {
                warn!(engine = %engine.name, endpoint = %engine.endpoint, error = %e, "Invalid engine endpoint");
                return BroadcastResult::transport_error(&engine.name, url, e.to_string());
            }
        };

        match self.client.get(request_url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    BroadcastResult::success(&engine.name, url, status.as_u16())
                } else {
                    warn!(engine = %engine.name, url = %url, status = status.as_u16(), "Submission rejected");
                    BroadcastResult::fault(
                        &engine.name,
                        url,
                        status.as_u16(),
                        format!("HTTP {}", status.as_u16()),
                    )
                }
            }
            Err(e) => {
                warn!(engine = %engine.name, url = %url, error = %e, "Submission failed");
                BroadcastResult::transport_error(&engine.name, url, e.to_string())
            }
        }
    }
}

/// Submit a site's cached URL snapshot.
///
/// A site without a key, a domain never crawled, and a crawl that stored
/// nothing are all skips, each with its own reason.
pub async fn submit_cached<S: BlobStore>(
    broadcaster: &IndexNowBroadcaster,
    cache: &UrlCache<S>,
    site: &SiteConfig,
) -> Result<Vec<SubmitResult>, SiteSkip> {
    site.indexnow_key()?;

    let urls = cache
        .load(&site.domain)?
        .ok_or_else(|| SiteSkip::CacheMiss {
            domain: site.domain.clone(),
            key: UrlCache::<S>::key(&site.domain),
        })?;

    if urls.is_empty() {
        return Err(SiteSkip::NoCachedUrls {
            domain: site.domain.clone(),
        });
    }

    broadcaster.broadcast(site, &urls).await
}
