//! IMAP search step
//!
//! A test step that connects to an IMAP server, looks for the first
//! message matching a set of regular expressions on sender, recipient,
//! subject and body, optionally deletes it or moves it to another
//! mailbox, and reports a [`SearchResult`] with the matched subject and
//! body and the elapsed time.
//!
//! ```no_run
//! # async fn demo() -> imap_search_executor::Result<()> {
//! use imap_search_executor::run_step;
//! use serde_json::json;
//!
//! let result = run_step(json!({
//!     "imaphost": "imap.example.com",
//!     "imapuser": "qa@example.com",
//!     "imappassword": "secret",
//!     "searchsubject": "Invoice",
//!     "deleteonsuccess": true,
//! }))
//! .await?;
//! assert!(result.passed(), "{}", result.err);
//! # Ok(())
//! # }
//! ```

mod action;
mod config;
mod connection;
mod error;
mod executor;
mod fetch;
mod mail;
mod mailbox;
mod matcher;
mod result;
mod trace;

pub use action::PostMatchAction;
pub use config::{DEFAULT_IMAPS_PORT, ImapConfig, Security, StepConfig, resolve_address};
pub use connection::{ImapSession, LOGOUT_TIMEOUT, connect, disconnect};
pub use error::{Error, ExtractError, Result};
pub use executor::{DEFAULT_ASSERTIONS, ImapExecutor, run_step};
pub use fetch::{FETCH_ITEMS, fetch_all};
pub use mail::{Mail, decode_header_text};
pub use mailbox::{Mailbox, message_count};
pub use matcher::{Matcher, SearchCriteria};
pub use result::SearchResult;
pub use trace::{Verbosity, WireTrace};
