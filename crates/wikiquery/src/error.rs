use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the client.
///
/// Absence of a requested entity (missing page, no revision before a date,
/// empty listing) is never an error; those cases come back as `None`, `false`
/// or an empty collection from the individual calls.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection-level transport failure. The only class the executor
    /// retries.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response body was not valid JSON. Never retried.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-transient HTTP error status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Well-formed error payload returned by the API.
    #[error("MediaWiki API error [{code}]: {info}")]
    Api { code: String, info: String },

    /// Rejected language code.
    #[error("invalid language code {0:?}")]
    Language(String),

    /// The page carries no language link for the requested language.
    #[error("no {language:?} language link on page {title:?}")]
    LanguageLinkMissing { title: String, language: String },

    /// The assembled request URL failed to parse.
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP client construction or request assembly failure.
    #[error("http client error: {0}")]
    Http(String),
}
