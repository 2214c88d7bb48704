use std::path::PathBuf;
use thiserror::Error;

/// A site record is missing something the current operation needs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("site entry has no domain")]
    MissingDomain,

    #[error("{domain}: no sitemaps configured")]
    MissingSitemaps { domain: String },

    #[error("{domain}: no ping services configured")]
    MissingServices { domain: String },

    #[error("{domain}: no indexnow_key configured")]
    MissingIndexNowKey { domain: String },
}

/// The site list itself could not be loaded. This is the only run-level failure.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read site list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse site list {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no sites found in {}", path.display())]
    Empty { path: PathBuf },

    #[error("no configured site matches '{0}'")]
    UnknownSite(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache blob {key} is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache blob {key} is not a list of URLs")]
    Shape { key: String },
}

/// Why one site was skipped. Never aborts the loop over sites.
#[derive(Error, Debug)]
pub enum SiteSkip {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{domain}: no cached URLs at {key}, run a crawl first")]
    CacheMiss { domain: String, key: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("{domain}: crawl stored no URLs")]
    NoCachedUrls { domain: String },

    #[error("{domain}: no valid URLs in cache")]
    NoValidUrls { domain: String },
}

impl SiteSkip {
    /// Skips that are expected states rather than problems worth an error line.
    pub fn is_informational(&self) -> bool {
        matches!(self, SiteSkip::NoCachedUrls { .. })
    }
}
