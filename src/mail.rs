//! Mail records extracted from fetch responses
//!
//! Header text may carry RFC 2047 encoded words
//! (`=?UTF-8?B?...?=`). Everything that patterns are matched against is
//! decoded first, so a subject pattern is written against the text a
//! human would read.

use crate::error::ExtractError;
use async_imap::imap_proto::Address;
use async_imap::types::Fetch;
use mailparse::MailHeaderMap;
use serde::Serialize;

/// One message, reduced to the fields a search can look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub uid: u32,
    pub body: String,
}

impl Mail {
    /// Build a [`Mail`] from one `FETCH (ENVELOPE RFC822.HEADER
    /// RFC822.TEXT UID)` response.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractError`] when a requested item is missing or
    /// the header block cannot be parsed.
    pub fn extract(fetch: &Fetch) -> Result<Self, ExtractError> {
        let seq = fetch.message;
        let uid = fetch.uid.ok_or(ExtractError::MissingUid { seq })?;
        let envelope = fetch
            .envelope()
            .ok_or(ExtractError::MissingEnvelope { seq })?;
        let header = fetch.header().ok_or(ExtractError::MissingHeader { seq })?;
        let text = fetch.text().ok_or(ExtractError::MissingText { seq })?;

        let (headers, _) =
            mailparse::parse_headers(header).map_err(|source| ExtractError::Header { seq, source })?;

        let subject = headers.get_first_value("Subject").unwrap_or_else(|| {
            envelope
                .subject
                .as_deref()
                .map(decode_header_text)
                .unwrap_or_default()
        });

        Ok(Self {
            from: format_addresses(envelope.from.as_deref()),
            to: format_addresses(envelope.to.as_deref()),
            subject,
            uid,
            body: String::from_utf8_lossy(text).into_owned(),
        })
    }
}

/// Decode a raw header value, expanding any encoded words.
///
/// Values that are not valid header syntax come back as lossy UTF-8.
#[must_use]
pub fn decode_header_text(raw: &[u8]) -> String {
    let mut line = b"X: ".to_vec();
    line.extend_from_slice(raw);
    match mailparse::parse_header(&line) {
        Ok((header, _)) => header.get_value(),
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    }
}

/// Render an envelope address list as `Name <mailbox@host>, ...`.
#[must_use]
pub fn format_addresses(addresses: Option<&[Address<'_>]>) -> String {
    addresses
        .unwrap_or_default()
        .iter()
        .filter_map(format_address)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_address(address: &Address<'_>) -> Option<String> {
    let mailbox = address.mailbox.as_deref().map(String::from_utf8_lossy)?;
    let email = match address.host.as_deref().map(String::from_utf8_lossy) {
        Some(host) if !host.is_empty() => format!("{mailbox}@{host}"),
        _ => mailbox.into_owned(),
    };
    let name = address
        .name
        .as_deref()
        .map(decode_header_text)
        .filter(|n| !n.trim().is_empty());

    Some(match name {
        Some(name) => format!("{name} <{email}>"),
        None => email,
    })
}
