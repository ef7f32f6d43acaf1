//! Mailbox names and mailbox-level commands
//!
//! [`Mailbox`] keeps `INBOX` (case-insensitive per RFC 3501) apart from
//! every other name. [`message_count`] and [`select`] are the two
//! commands the search issues against it before fetching.

use crate::connection::ImapSession;
use crate::error::{Error, Result};
use async_imap::imap_proto::{MailboxDatum, Response, Status, StatusAttribute};
use std::fmt;
use tracing::debug;

/// An IMAP mailbox.
///
/// # Examples
///
/// ```
/// use imap_search_executor::Mailbox;
///
/// assert_eq!(Mailbox::from_setting("").as_str(), "INBOX");
/// assert_eq!(Mailbox::from_setting("Archive").as_str(), "Archive");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Mailbox {
    /// The INBOX mailbox, used when nothing else is configured.
    #[default]
    Inbox,
    /// Any other mailbox, by exact name.
    Named(String),
}

impl Mailbox {
    /// Mailbox for a configuration value; blank means `INBOX`.
    #[must_use]
    pub fn from_setting(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("inbox") {
            Self::Inbox
        } else {
            Self::Named(name.to_string())
        }
    }

    /// The IMAP mailbox name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inbox => "INBOX",
            Self::Named(name) => name,
        }
    }

    /// The name as an IMAP quoted string.
    #[must_use]
    pub fn quoted(&self) -> String {
        let escaped = self.as_str().replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Mailbox {
    fn from(s: &str) -> Self {
        Self::from_setting(s)
    }
}

/// Number of messages in `mailbox`, from `STATUS (MESSAGES)`.
///
/// Every STATUS response that arrives before the command completes is
/// counted, so a server answering with several yields their sum. An
/// empty mailbox is a valid zero.
///
/// # Errors
///
/// Returns [`Error::Query`] if the command fails or the server answers
/// with NO or BAD.
pub async fn message_count(session: &mut ImapSession, mailbox: &Mailbox) -> Result<u32> {
    let command = format!("STATUS {} (MESSAGES)", mailbox.quoted());
    let request = session
        .run_command(&command)
        .await
        .map_err(|e| Error::Query(e.to_string()))?;

    let mut count: u32 = 0;
    loop {
        let Some(response) = session
            .read_response()
            .await
            .map_err(|e| Error::Query(e.to_string()))?
        else {
            return Err(Error::Query("connection closed during STATUS".into()));
        };

        match response.parsed() {
            Response::MailboxData(MailboxDatum::Status { status, .. }) => {
                for attribute in status {
                    if let StatusAttribute::Messages(n) = attribute {
                        count = count.saturating_add(*n);
                    }
                }
            }
            Response::Done {
                tag,
                status,
                information,
                ..
            } if *tag == request => {
                return match status {
                    Status::Ok => {
                        debug!("{} holds {} message(s)", mailbox, count);
                        Ok(count)
                    }
                    _ => Err(Error::Query(format!(
                        "STATUS {mailbox} failed: {}",
                        information.as_deref().unwrap_or("no reason given")
                    ))),
                };
            }
            _ => {}
        }
    }
}

/// SELECT `mailbox` read-write, so a match can later be deleted or moved.
///
/// # Errors
///
/// Returns [`Error::Fetch`] if the server refuses the mailbox.
pub async fn select(session: &mut ImapSession, mailbox: &Mailbox) -> Result<()> {
    session
        .select(mailbox.as_str())
        .await
        .map_err(|e| Error::Fetch(format!("failed to select {mailbox}: {e}")))?;
    Ok(())
}
