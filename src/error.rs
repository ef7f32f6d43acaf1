//! Error types for imap-search-executor
//!
//! [`Error`] is terminal: any variant stops the search and its display
//! text becomes [`crate::SearchResult::err`]. [`ExtractError`] is the
//! continuable path used while scanning, the offending message is
//! skipped and the scan moves on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("you have to use one of searchfrom, searchto, searchsubject or subjectbody parameters")]
    NoSearchCriteria,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("error while connecting: {0}")]
    Connect(String),

    #[error("error while querying message count: {0}")]
    Query(String),

    #[error("error while fetching messages: {0}")]
    Fetch(String),

    #[error("invalid {field} pattern: {source}")]
    Pattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("no message to fetch")]
    NoMessage,

    #[error("mail not found")]
    NotFound,

    #[error("{0}")]
    Action(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single fetched message could not be turned into a [`crate::Mail`].
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("message {seq} has no UID")]
    MissingUid { seq: u32 },

    #[error("message {seq} has no envelope")]
    MissingEnvelope { seq: u32 },

    #[error("message {seq} has no RFC822 header")]
    MissingHeader { seq: u32 },

    #[error("message {seq} has no RFC822 text")]
    MissingText { seq: u32 },

    #[error("message {seq} has a malformed header: {source}")]
    Header {
        seq: u32,
        #[source]
        source: mailparse::MailParseError,
    },
}
