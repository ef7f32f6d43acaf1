//! What happens to a matched message

use crate::connection::ImapSession;
use crate::error::{Error, Result};
use crate::mailbox::Mailbox;
use futures::TryStreamExt;
use tracing::debug;

/// Store query that flags a message for deletion without asking the
/// server to echo the new flags back.
const DELETE_FLAGS: &str = "+FLAGS.SILENT (\\Deleted)";

/// Side effect applied to the first matching message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostMatchAction {
    /// Flag `\Deleted`, then EXPUNGE.
    Delete,
    /// UID MOVE into another mailbox.
    Move(Mailbox),
    /// Leave the message where it is.
    Keep,
}

impl PostMatchAction {
    /// Delete wins over move; a blank target means no move.
    #[must_use]
    pub fn from_settings(delete_on_success: bool, mailbox_on_success: &str) -> Self {
        if delete_on_success {
            Self::Delete
        } else if mailbox_on_success.trim().is_empty() {
            Self::Keep
        } else {
            Self::Move(Mailbox::from_setting(mailbox_on_success))
        }
    }

    /// Apply the action to the message with `uid` in the selected
    /// mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Action`] if STORE, EXPUNGE or MOVE fails.
    pub async fn apply(&self, session: &mut ImapSession, uid: u32) -> Result<()> {
        match self {
            Self::Delete => {
                debug!("Delete message {}", uid);
                delete(session, uid).await
            }
            Self::Move(target) => {
                debug!("Move message {} to {}", uid, target);
                session
                    .uid_mv(uid.to_string(), target.as_str())
                    .await
                    .map_err(|e| Error::Action(format!("error while moving msg to {target}: {e}")))
            }
            Self::Keep => Ok(()),
        }
    }
}

async fn delete(session: &mut ImapSession, uid: u32) -> Result<()> {
    session
        .uid_store(uid.to_string(), DELETE_FLAGS)
        .await
        .map_err(|e| Error::Action(format!("error while deleting msg: {e}")))?
        .try_collect::<Vec<_>>()
        .await
        .map_err(|e| Error::Action(format!("error while deleting msg: {e}")))?;

    session
        .expunge()
        .await
        .map_err(|e| Error::Action(format!("error while expunging messages: {e}")))?
        .try_collect::<Vec<_>>()
        .await
        .map_err(|e| Error::Action(format!("error while expunging messages: {e}")))?;

    Ok(())
}
