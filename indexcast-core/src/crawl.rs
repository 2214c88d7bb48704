use crate::cache::{BlobStore, UrlCache};
use crate::error::SiteSkip;
use crate::site::SiteConfig;
use indexcast_scanner::{SitemapFailure, SitemapResolver};
use serde::{Deserialize, Serialize};
use tracing::info;

/// What one crawl stored for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub domain: String,
    pub urls_stored: usize,
    pub documents_fetched: usize,
    pub rejected_locs: usize,
    pub failures: Vec<SitemapFailure>,
}

/// Resolve a site's sitemaps and replace its cached snapshot with the result.
///
/// An empty result is still written, so "crawled, found nothing" stays
/// distinguishable from "never crawled".
pub async fn crawl_site<S: BlobStore>(
    resolver: &SitemapResolver,
    cache: &UrlCache<S>,
    site: &SiteConfig,
) -> Result<CrawlSummary, SiteSkip> {
    let roots = site.sitemap_roots()?;
    info!(domain = %site.domain, roots = roots.len(), "Fetching sitemaps");

    let resolution = resolver.resolve_detailed(roots).await;
    cache.save(&site.domain, &resolution.urls)?;

    info!(
        domain = %site.domain,
        key = %UrlCache::<S>::key(&site.domain),
        "Stored {} URLs",
        resolution.urls.len()
    );

    Ok(CrawlSummary {
        domain: site.domain.clone(),
        urls_stored: resolution.urls.len(),
        documents_fetched: resolution.documents_fetched,
        rejected_locs: resolution.rejected_locs,
        failures: resolution.failures,
    })
}
