use crate::errors::{FetchError, ParseError};
use crate::models::record::RawQuote;
use async_trait::async_trait;

/// Retrieves the raw response body from the configured source
#[async_trait]
pub trait Fetcher {
    /// Source description used in log messages
    fn source(&self) -> &str;

    /// Fetch the raw body, retrying transient failures
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Locates the target listing's fields in a raw response body
pub trait Extractor {
    /// Strategy name for log messages
    fn name(&self) -> &'static str;

    /// Parse the body into a dated set of raw field values
    fn extract(&self, body: &str) -> Result<RawQuote, ParseError>;
}
