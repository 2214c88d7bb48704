// Site registry: the list of managed domains and what to do with each

use crate::error::{ConfigError, RegistryError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// One managed site, as written in the site list.
///
/// Only `domain` is required to load; each operation checks the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sitemaps: Vec<String>,
    /// Ping service name -> XML-RPC endpoint
    pub services: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexnow_key: Option<String>,
}

impl SiteConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_sitemap(mut self, sitemap: impl Into<String>) -> Self {
        self.sitemaps.push(sitemap.into());
        self
    }

    pub fn with_service(mut self, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.services.insert(name.into(), endpoint.into());
        self
    }

    pub fn with_feed_url(mut self, feed_url: impl Into<String>) -> Self {
        self.feed_url = Some(feed_url.into());
        self
    }

    pub fn with_indexnow_key(mut self, key: impl Into<String>) -> Self {
        self.indexnow_key = Some(key.into());
        self
    }

    /// Human-readable title, falling back to the domain.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.domain,
        }
    }

    /// Public home page announced to ping services.
    pub fn site_url(&self) -> String {
        format!("https://{}/", self.domain)
    }

    pub fn feed_url(&self) -> Option<&str> {
        non_blank(self.feed_url.as_deref())
    }

    pub fn sitemap_roots(&self) -> Result<&[String], ConfigError> {
        self.require_domain()?;
        if self.sitemaps.is_empty() {
            return Err(ConfigError::MissingSitemaps {
                domain: self.domain.clone(),
            });
        }
        Ok(&self.sitemaps)
    }

    pub fn ping_services(&self) -> Result<&BTreeMap<String, String>, ConfigError> {
        self.require_domain()?;
        if self.services.is_empty() {
            return Err(ConfigError::MissingServices {
                domain: self.domain.clone(),
            });
        }
        Ok(&self.services)
    }

    pub fn indexnow_key(&self) -> Result<&str, ConfigError> {
        self.require_domain()?;
        non_blank(self.indexnow_key.as_deref()).ok_or_else(|| ConfigError::MissingIndexNowKey {
            domain: self.domain.clone(),
        })
    }

    fn require_domain(&self) -> Result<&str, ConfigError> {
        non_blank(Some(self.domain.as_str())).ok_or(ConfigError::MissingDomain)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The ordered list of sites loaded for one run.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<SiteConfig>,
    skipped: usize,
}

impl SiteRegistry {
    /// Load a JSON array of site records.
    ///
    /// Entries without a domain are skipped with a warning; an unreadable file,
    /// bad JSON or an empty array is an error.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, path)
    }

    pub fn from_json(content: &str, origin: &Path) -> Result<Self, RegistryError> {
        let entries: Vec<SiteConfig> =
            serde_json::from_str(content).map_err(|source| RegistryError::Json {
                path: origin.to_path_buf(),
                source,
            })?;

        if entries.is_empty() {
            return Err(RegistryError::Empty {
                path: origin.to_path_buf(),
            });
        }

        let total = entries.len();
        let sites: Vec<SiteConfig> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, mut site)| {
                site.domain = site.domain.trim().to_string();
                if let Err(e) = site.require_domain() {
                    warn!(entry = idx, error = %e, "Skipping site entry");
                    return None;
                }
                Some(site)
            })
            .collect();

        Ok(Self {
            skipped: total - sites.len(),
            sites,
        })
    }

    pub fn from_sites(sites: Vec<SiteConfig>) -> Self {
        Self { sites, skipped: 0 }
    }

    /// Keep only the site with this domain.
    pub fn retain_domain(self, domain: &str) -> Result<Self, RegistryError> {
        let sites: Vec<SiteConfig> = self
            .sites
            .into_iter()
            .filter(|s| s.domain.eq_ignore_ascii_case(domain))
            .collect();

        if sites.is_empty() {
            return Err(RegistryError::UnknownSite(domain.to_string()));
        }

        Ok(Self {
            sites,
            skipped: self.skipped,
        })
    }

    pub fn sites(&self) -> &[SiteConfig] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Entries dropped at load time for lacking a domain.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
