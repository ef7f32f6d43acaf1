//! Step configuration
//!
//! [`StepConfig`] mirrors the untyped step fields a test harness hands
//! over, keyed the way step files spell them (`imaphost`, `searchfrom`,
//! ...). Everything is optional; [`crate::SearchCriteria::ensure_any`]
//! enforces the one real invariant before any network activity.

use crate::action::PostMatchAction;
use crate::error::{Error, Result};
use crate::mailbox::Mailbox;
use crate::matcher::SearchCriteria;
use crate::trace::{Verbosity, WireTrace};
use serde::{Deserialize, Deserializer};
use std::env;
use std::fmt;

/// Port used when neither the host nor the port field names one.
pub const DEFAULT_IMAPS_PORT: &str = "993";

/// How the connection gets encrypted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Security {
    /// TLS from the first byte (IMAPS).
    #[default]
    Tls,
    /// Plaintext greeting, then STARTTLS before LOGIN.
    StartTls,
}

/// Everything the connection manager needs.
#[derive(Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: Option<String>,
    pub username: String,
    pub password: String,
    pub security: Security,
    /// Accept any server certificate (self-signed test servers).
    pub accept_invalid_certs: bool,
    pub trace: WireTrace,
}

impl ImapConfig {
    /// `host:port` to dial.
    ///
    /// A host that already carries a port wins over the port field. A
    /// missing port falls back to [`DEFAULT_IMAPS_PORT`].
    #[must_use]
    pub fn address(&self) -> String {
        resolve_address(&self.host, self.port.as_deref())
    }

    /// The host part of [`Self::address`], used for TLS SNI.
    #[must_use]
    pub fn server_name(&self) -> &str {
        self.host
            .rsplit_once(':')
            .map_or(self.host.as_str(), |(host, _)| host)
    }
}

impl fmt::Debug for ImapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("security", &self.security)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("trace", &self.trace)
            .finish()
    }
}

/// Join host and port the way the dialer expects them.
#[must_use]
pub fn resolve_address(host: &str, port: Option<&str>) -> String {
    if host.contains(':') {
        return host.to_string();
    }
    match port.map(str::trim).filter(|p| !p.is_empty()) {
        None => format!("{host}:{DEFAULT_IMAPS_PORT}"),
        Some(port) if port.starts_with(':') => format!("{host}{port}"),
        Some(port) => format!("{host}:{port}"),
    }
}

/// Typed fields of one search step.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    #[serde(rename = "imaphost")]
    pub host: String,
    #[serde(rename = "imapport", deserialize_with = "port_string")]
    pub port: String,
    #[serde(rename = "imapuser")]
    pub user: String,
    #[serde(rename = "imappassword")]
    pub password: String,
    #[serde(rename = "mbox")]
    pub mailbox: String,
    #[serde(rename = "mboxonsuccess")]
    pub mailbox_on_success: String,
    #[serde(rename = "deleteonsuccess")]
    pub delete_on_success: bool,
    #[serde(rename = "searchfrom")]
    pub search_from: String,
    #[serde(rename = "searchto")]
    pub search_to: String,
    #[serde(rename = "searchsubject")]
    pub search_subject: String,
    #[serde(rename = "searchbody")]
    pub search_body: String,
    #[serde(rename = "imapstarttls")]
    pub starttls: bool,
    #[serde(rename = "imapinsecure")]
    pub insecure: bool,
    #[serde(rename = "imaptrace")]
    pub trace: Verbosity,
}

impl StepConfig {
    /// Decode a step from its untyped representation.
    ///
    /// This is the only place a hard failure can come from: a value
    /// that does not fit the step's shape. Only a map is a step; serde
    /// would otherwise decode a sequence field by field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `value` is not a map or does not
    /// decode.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::Config("invalid step: expected a map".into()));
        }
        serde_json::from_value(value).map_err(|e| Error::Config(format!("invalid step: {e}")))
    }

    /// Load the connection fields from environment variables.
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `IMAP_HOST`
    /// - `IMAP_USERNAME`
    /// - `IMAP_PASSWORD`
    ///
    /// Optional:
    /// - `IMAP_PORT` (default: `993`)
    /// - `IMAP_STARTTLS` (`true` to upgrade a plaintext connection)
    /// - `IMAP_INSECURE` (`true` to accept any certificate)
    /// - `IMAP_TRACE` (`off`, `commands` or `full`)
    ///
    /// Search and action fields are left empty for the caller to fill.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or
    /// a flag has an unrecognised value.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("IMAP_HOST").map_err(|_| Error::Config("IMAP_HOST not set".into()))?,
            port: env::var("IMAP_PORT").unwrap_or_default(),
            user: env::var("IMAP_USERNAME")
                .map_err(|_| Error::Config("IMAP_USERNAME not set".into()))?,
            password: env::var("IMAP_PASSWORD")
                .map_err(|_| Error::Config("IMAP_PASSWORD not set".into()))?,
            starttls: env_flag("IMAP_STARTTLS")?,
            insecure: env_flag("IMAP_INSECURE")?,
            trace: env::var("IMAP_TRACE")
                .unwrap_or_default()
                .parse()
                .map_err(|e| Error::Config(format!("Invalid IMAP_TRACE: {e}")))?,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn imap(&self) -> ImapConfig {
        ImapConfig {
            host: self.host.clone(),
            port: Some(self.port.clone()).filter(|p| !p.is_empty()),
            username: self.user.clone(),
            password: self.password.clone(),
            security: if self.starttls {
                Security::StartTls
            } else {
                Security::Tls
            },
            accept_invalid_certs: self.insecure,
            trace: WireTrace::new(self.trace),
        }
    }

    #[must_use]
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            from: self.search_from.clone(),
            to: self.search_to.clone(),
            subject: self.search_subject.clone(),
            body: self.search_body.clone(),
        }
    }

    /// Mailbox to search, `INBOX` when unset.
    #[must_use]
    pub fn source_mailbox(&self) -> Mailbox {
        Mailbox::from_setting(&self.mailbox)
    }

    #[must_use]
    pub fn action(&self) -> PostMatchAction {
        PostMatchAction::from_settings(self.delete_on_success, &self.mailbox_on_success)
    }
}

impl fmt::Debug for StepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("mailbox", &self.mailbox)
            .field("mailbox_on_success", &self.mailbox_on_success)
            .field("delete_on_success", &self.delete_on_success)
            .field("search_from", &self.search_from)
            .field("search_to", &self.search_to)
            .field("search_subject", &self.search_subject)
            .field("search_body", &self.search_body)
            .field("starttls", &self.starttls)
            .field("insecure", &self.insecure)
            .field("trace", &self.trace)
            .finish()
    }
}

/// Ports arrive as strings in step files but as numbers from some
/// harnesses; accept both.
fn port_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u16),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(text) => text,
        Port::Number(number) => number.to_string(),
    })
}

fn env_flag(name: &str) -> Result<bool> {
    match env::var(name) {
        Err(_) => Ok(false),
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "no" => Ok(false),
            "1" | "true" | "yes" => Ok(true),
            other => Err(Error::Config(format!("Invalid {name}: {other}"))),
        },
    }
}
