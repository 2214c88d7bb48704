pub mod cache;
pub mod crawl;
pub mod error;
pub mod indexnow;
pub mod outcome;
pub mod ping;
pub mod report;
pub mod site;

pub use cache::{BlobStore, FsBlobStore, UrlCache};
pub use crawl::{CrawlSummary, crawl_site};
pub use error::{CacheError, ConfigError, RegistryError, SiteSkip};
pub use indexnow::{Engine, IndexNowBroadcaster, submit_cached};
pub use outcome::{BroadcastResult, Outcome, PingResult, SubmitResult, Tally};
pub use ping::{PingBroadcaster, PingPayload};
pub use site::{SiteConfig, SiteRegistry};
