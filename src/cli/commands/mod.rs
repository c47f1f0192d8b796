//! Command implementations, one module per subcommand.

pub mod channel;
pub mod chat;
pub mod comments;
pub mod crawl;
pub mod video;

use std::sync::Arc;

use crate::config::Settings;
use crate::fetch::HttpClient;

/// Build the shared HTTP fetcher from settings.
pub(super) fn build_fetcher(settings: &Settings) -> anyhow::Result<Arc<HttpClient>> {
    Ok(Arc::new(HttpClient::new(settings.fetch.clone())?))
}
