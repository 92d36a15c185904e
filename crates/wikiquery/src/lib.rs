//! Client library for the MediaWiki web API as deployed on the Wikipedia
//! language editions.
//!
//! [`WikiClient`] wraps the common lookups (page existence and ids, raw and
//! rendered text, revision history, categories, links, language links,
//! random titles, page view statistics) over one shared request path with
//! bounded retry and continuation-token pagination. The [`markup`] module
//! holds the regex helpers for light scraping of raw wiki markup.
//!
//! ```no_run
//! use wikiquery::WikiClient;
//!
//! fn main() -> wikiquery::Result<()> {
//!     let client = WikiClient::for_language("en")?;
//!     if client.exists("Albert Einstein")? {
//!         let categories = client.categories("Albert Einstein")?;
//!         println!("{categories:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod date;
mod error;
mod events;
mod listings;
pub mod markup;
mod pages;
mod response;
mod revisions;
mod stats;
mod text;

pub use client::{
    DEFAULT_ENDPOINT_TEMPLATE, DEFAULT_RETRY_BUDGET, DEFAULT_RETRY_WAIT, DEFAULT_STATS_TEMPLATE,
    DEFAULT_TIMEOUT, HttpTransport, Transport, WikiClient, WikiClientConfig,
};
pub use date::Date;
pub use error::{Error, Result};
pub use events::CurrentEvent;
pub use revisions::{Revision, RevisionOrder};
pub use stats::{MonthlyViews, PageViewStats};
pub use text::{RawText, RenderedText};
