//! Per-connection IMAP wire trace
//!
//! Every byte exchanged with the server passes through a
//! [`TracedStream`], which logs it under the `imap_search::wire` target
//! at `TRACE` level according to the connection's current
//! [`Verbosity`]. The verbosity lives in a [`WireTracer`] handle owned
//! by a single connection, so muting it during LOGIN never affects any
//! other connection in the process.

use serde::Deserialize;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::trace;

/// How much of the protocol exchange gets logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Nothing is logged.
    #[default]
    Off,
    /// Only lines sent by the client.
    Commands,
    /// Both directions.
    Full,
}

impl Verbosity {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Commands => 1,
            Self::Full => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Commands,
            2 => Self::Full,
            _ => Self::Off,
        }
    }

    const fn logs_client(self) -> bool {
        !matches!(self, Self::Off)
    }

    const fn logs_server(self) -> bool {
        matches!(self, Self::Full)
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "off" | "none" => Ok(Self::Off),
            "commands" => Ok(Self::Commands),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown trace verbosity '{other}'")),
        }
    }
}

/// Trace settings for one connection setup call.
///
/// `login` applies only while credentials are on the wire; `session`
/// applies before and after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WireTrace {
    pub session: Verbosity,
    pub login: Verbosity,
}

impl WireTrace {
    #[must_use]
    pub const fn new(session: Verbosity) -> Self {
        Self {
            session,
            login: Verbosity::Off,
        }
    }
}

/// Shared handle to a connection's current verbosity.
#[derive(Debug, Clone, Default)]
pub struct WireTracer {
    level: Arc<AtomicU8>,
}

impl WireTracer {
    #[must_use]
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            level: Arc::new(AtomicU8::new(verbosity.as_u8())),
        }
    }

    pub fn set(&self, verbosity: Verbosity) {
        self.level.store(verbosity.as_u8(), Ordering::Relaxed);
    }

    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Render client bytes for the log, or `None` if muted.
    fn client_line(&self, data: &[u8]) -> Option<String> {
        self.verbosity()
            .logs_client()
            .then(|| render("C", data))
    }

    /// Render server bytes for the log, or `None` if muted.
    fn server_line(&self, data: &[u8]) -> Option<String> {
        self.verbosity()
            .logs_server()
            .then(|| render("S", data))
    }
}

fn render(direction: &str, data: &[u8]) -> String {
    format!("{direction}: {}", String::from_utf8_lossy(data).trim_end())
}

/// A stream that reports what flows through it to a [`WireTracer`].
#[derive(Debug)]
pub struct TracedStream<S> {
    inner: S,
    tracer: WireTracer,
}

impl<S> TracedStream<S> {
    pub const fn new(inner: S, tracer: WireTracer) -> Self {
        Self { inner, tracer }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TracedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll
            && buf.filled().len() > before
            && let Some(line) = this.tracer.server_line(&buf.filled()[before..])
        {
            trace!(target: "imap_search::wire", "{line}");
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TracedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = poll
            && let Some(line) = this.tracer.client_line(&buf[..n])
        {
            trace!(target: "imap_search::wire", "{line}");
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Commands => "commands",
            Self::Full => "full",
        })
    }
}
