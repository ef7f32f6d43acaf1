//! Bulk message retrieval

use crate::connection::ImapSession;
use crate::error::{Error, Result};
use crate::mailbox::{self, Mailbox};
use async_imap::types::Fetch;
use futures::StreamExt;
use tracing::{debug, error};

/// Data items requested for every message.
pub const FETCH_ITEMS: &str = "(ENVELOPE RFC822.HEADER RFC822.TEXT UID)";

/// Most slots reserved up front, whatever STATUS claimed.
const MAX_PREALLOCATED: u32 = 1024;

/// Initial capacity for `expected` messages. The count comes from the
/// server, so it is only trusted up to [`MAX_PREALLOCATED`].
const fn capacity_hint(expected: u32) -> usize {
    if expected < MAX_PREALLOCATED {
        expected as usize
    } else {
        MAX_PREALLOCATED as usize
    }
}

/// SELECT `mailbox` and fetch every message in it.
///
/// A single `FETCH 1:*` is issued and its responses are drained one by
/// one until the server completes the command. There is no per-response
/// timeout: a server that stops talking mid-fetch blocks this call
/// until the connection itself fails.
///
/// Responses are returned in the order the server sent them.
///
/// # Errors
///
/// Returns [`Error::Fetch`] if SELECT, the FETCH command or any of its
/// responses fails.
pub async fn fetch_all(
    session: &mut ImapSession,
    mailbox: &Mailbox,
    expected: u32,
) -> Result<Vec<Fetch>> {
    debug!("Selecting {}", mailbox);
    if let Err(e) = mailbox::select(session, mailbox).await {
        error!("Error with select: {}", e);
        return Err(e);
    }

    let mut stream = session.fetch("1:*", FETCH_ITEMS).await.map_err(|e| {
        error!("Error with fetch: {}", e);
        Error::Fetch(e.to_string())
    })?;

    let mut messages = Vec::with_capacity(capacity_hint(expected));
    while let Some(item) = stream.next().await {
        messages.push(item.map_err(|e| Error::Fetch(e.to_string()))?);
    }
    drop(stream);

    debug!("Fetched {} of {} message(s)", messages.len(), expected);
    Ok(messages)
}
