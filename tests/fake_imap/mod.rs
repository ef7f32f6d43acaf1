//! Fake IMAP server for integration testing
//!
//! An in-process IMAP server that speaks enough of the protocol to run
//! a search step end-to-end:
//!
//! TCP -> TLS and/or STARTTLS -> LOGIN -> STATUS -> SELECT -> FETCH ->
//! UID STORE + EXPUNGE or UID MOVE -> LOGOUT
//!
//! ## Module layout
//!
//! - `server` -- TCP listener, TLS setup, transports, command dispatch
//! - `handlers/` -- one file per IMAP command (STATUS, FETCH, etc.)
//! - `mailbox` -- test data model (folders, emails, builder)
//! - `io` -- shared write helpers

mod io;

pub use mailbox::MailboxBuilder;
pub use server::{FakeImapServer, ServerOptions, Transport};
