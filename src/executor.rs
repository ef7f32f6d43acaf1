//! IMAP search step executor

use crate::config::StepConfig;
use crate::connection::{self, ImapSession};
use crate::error::{Error, Result};
use crate::fetch;
use crate::mail::Mail;
use crate::mailbox;
use crate::matcher::Matcher;
use crate::result::SearchResult;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Assertion a harness applies when the step declares none.
pub const DEFAULT_ASSERTIONS: &[&str] = &["result.err ShouldNotExist"];

/// Finds the first message matching a [`StepConfig`] and acts on it.
///
/// Each call to [`ImapExecutor::run`] opens its own connection and
/// releases it before returning. Nothing is shared between calls.
pub struct ImapExecutor {
    config: StepConfig,
}

impl ImapExecutor {
    #[must_use]
    pub const fn new(config: StepConfig) -> Self {
        Self { config }
    }

    /// Build an executor from an untyped step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the value does not decode.
    pub fn from_step(step: serde_json::Value) -> Result<Self> {
        StepConfig::from_value(step).map(Self::new)
    }

    #[must_use]
    pub const fn config(&self) -> &StepConfig {
        &self.config
    }

    #[must_use]
    pub const fn default_assertions() -> &'static [&'static str] {
        DEFAULT_ASSERTIONS
    }

    /// Run the search and report the outcome.
    ///
    /// Never fails: every problem, from missing criteria to a failed
    /// EXPUNGE, ends up as text in [`SearchResult::err`].
    ///
    /// No cancellation is wired into the network calls. Dropping the
    /// returned future is the only way to stop it early, and that drops
    /// the connection without a LOGOUT.
    pub async fn run(&self) -> SearchResult {
        let start = Instant::now();
        let outcome = self.find().await;
        if let Err(e) = &outcome {
            debug!("Search failed: {}", e);
        }
        SearchResult::from_outcome(outcome, start.elapsed())
    }

    /// Search for the first matching message, apply the configured
    /// action to it, and return it.
    ///
    /// Every pattern is compiled before the scan, so an invalid one fails
    /// the step even when an earlier filter would have rejected every
    /// message.
    ///
    /// # Errors
    ///
    /// Returns the first terminal [`Error`] hit along the way, including
    /// [`Error::NoMessage`] and [`Error::NotFound`].
    pub async fn find(&self) -> Result<Mail> {
        self.config.criteria().ensure_any()?;

        let mut session = connection::connect(&self.config.imap()).await?;
        let outcome = self.search(&mut session).await;
        connection::disconnect(session).await;
        outcome
    }

    async fn search(&self, session: &mut ImapSession) -> Result<Mail> {
        let source = self.config.source_mailbox();

        let count = mailbox::message_count(session, &source).await?;
        debug!("count messages: {}", count);
        if count == 0 {
            return Err(Error::NoMessage);
        }

        let messages = fetch::fetch_all(session, &source, count).await?;
        let matcher = Matcher::compile(&self.config.criteria())?;

        for message in &messages {
            let mail = match Mail::extract(message) {
                Ok(mail) => mail,
                Err(e) => {
                    warn!("Cannot extract the content of the mail: {}", e);
                    continue;
                }
            };

            if matcher.matches(&mail) {
                info!("Found matching message UID {} in {}", mail.uid, source);
                self.config.action().apply(session, mail.uid).await?;
                return Ok(mail);
            }
        }

        Err(Error::NotFound)
    }
}

/// Decode `step` and run it once.
///
/// The only hard failure is a step that does not decode; everything
/// else is reported inside the returned [`SearchResult`].
///
/// # Errors
///
/// Returns [`Error::Config`] if `step` does not fit the step's shape.
pub async fn run_step(step: serde_json::Value) -> Result<SearchResult> {
    let executor = ImapExecutor::from_step(step)?;
    Ok(executor.run().await)
}
