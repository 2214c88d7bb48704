pub mod error;
pub mod node;
pub mod resolver;
pub mod result;

pub use error::ScanError;
pub use node::{SitemapNode, parse};
pub use resolver::{ProgressCallback, SitemapResolver, is_page_url};
pub use result::{FailureStage, Resolution, SitemapFailure};
