//! IMAP connection setup and teardown
//!
//! Provides [`connect()`], which dials the server, negotiates TLS,
//! authenticates and hands back a session, and [`disconnect()`], which
//! logs out with a bounded wait.

use crate::config::{ImapConfig, Security};
use crate::error::{Error, Result};
use crate::trace::{TracedStream, WireTracer};
use async_imap::imap_proto::{Capability, Response, ResponseCode};
use async_imap::{Client, Session};
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info, warn};

/// How long LOGOUT may take before the connection is simply dropped.
pub const LOGOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Any bidirectional byte stream an IMAP session can run over.
pub trait ImapIo: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug> ImapIo for T {}

/// The transport under the session: TCP, TLS, or TLS inside TLS after
/// a redundant STARTTLS, all behind one type.
pub type BoxedStream = Box<dyn ImapIo>;

type ImapClient = Client<Compat<TracedStream<BoxedStream>>>;

/// A traced, encrypted, authenticated IMAP session.
pub type ImapSession = Session<Compat<TracedStream<BoxedStream>>>;

/// Build the TLS connector for `config`.
///
/// Certificates are checked against the webpki roots unless the
/// configuration opts into accepting anything.
fn tls_connector(config: &ImapConfig) -> Result<TlsConnector> {
    let builder = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| Error::Connect(format!("unable to dial: TLS setup failed: {e}")))?;

    let tls = if config.accept_invalid_certs {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder
            .with_root_certificates(roots)
            .with_no_client_auth()
    };
    Ok(TlsConnector::from(Arc::new(tls)))
}

/// Wrap `stream` in TLS for `server_name`.
async fn handshake(
    connector: &TlsConnector,
    server_name: &ServerName<'static>,
    stream: BoxedStream,
) -> std::io::Result<BoxedStream> {
    let tls = connector.connect(server_name.clone(), stream).await?;
    Ok(Box::new(tls))
}

/// Whether the greeting's capability code lists STARTTLS.
fn advertises_starttls(greeting: &Response<'_>) -> bool {
    match greeting {
        Response::Data {
            code: Some(ResponseCode::Capabilities(caps)),
            ..
        } => caps
            .iter()
            .any(|cap| matches!(cap, Capability::Atom(atom) if atom.eq_ignore_ascii_case("STARTTLS"))),
        _ => false,
    }
}

/// Issue STARTTLS on `client` and return a client over the upgraded
/// stream. The tracer is carried over to the new stream.
async fn starttls(
    mut client: ImapClient,
    connector: &TlsConnector,
    server_name: &ServerName<'static>,
    tracer: &WireTracer,
) -> Result<ImapClient> {
    client
        .run_command_and_check_ok("STARTTLS", None)
        .await
        .map_err(|e| Error::Connect(format!("unable to start TLS: {e}")))?;

    let inner = client.into_inner().into_inner().into_inner();
    let upgraded = handshake(connector, server_name, inner)
        .await
        .map_err(|e| Error::Connect(format!("unable to start TLS: {e}")))?;

    Ok(Client::new(
        TracedStream::new(upgraded, tracer.clone()).compat(),
    ))
}

/// Open an authenticated IMAP session.
///
/// Dials `config.address()`. With [`Security::Tls`] the TLS handshake
/// happens right after TCP connect, and a STARTTLS advertised in the
/// greeting is still honoured. With [`Security::StartTls`] the greeting
/// arrives in plaintext and STARTTLS is always issued. LOGIN runs with
/// `config.trace.login` verbosity; `config.trace.session` is restored
/// once it completes.
///
/// # Errors
///
/// Returns [`Error::Connect`] if dialing, TLS, the greeting, STARTTLS
/// or LOGIN fails.
pub async fn connect(config: &ImapConfig) -> Result<ImapSession> {
    let addr = config.address();
    debug!("Connecting to IMAP server at {}", addr);

    let connector = tls_connector(config)?;
    let server_name = ServerName::try_from(config.server_name().to_string())
        .map_err(|e| Error::Connect(format!("unable to dial: invalid server name: {e}")))?;
    let tracer = WireTracer::new(config.trace.session);

    let tcp = TcpStream::connect(&addr)
        .await
        .map_err(|e| Error::Connect(format!("unable to dial: {e}")))?;

    let stream: BoxedStream = match config.security {
        Security::Tls => handshake(&connector, &server_name, Box::new(tcp))
            .await
            .map_err(|e| Error::Connect(format!("unable to dial: {e}")))?,
        Security::StartTls => Box::new(tcp),
    };

    let mut client = Client::new(TracedStream::new(stream, tracer.clone()).compat());
    let greeting = client
        .read_response()
        .await
        .map_err(|e| Error::Connect(format!("unable to dial: {e}")))?
        .ok_or_else(|| {
            Error::Connect("unable to dial: server closed connection before greeting".into())
        })?;

    let upgrade = match config.security {
        Security::StartTls => true,
        Security::Tls => advertises_starttls(greeting.parsed()),
    };
    if upgrade {
        debug!("Upgrading connection with STARTTLS");
        client = starttls(client, &connector, &server_name, &tracer).await?;
    }

    tracer.set(config.trace.login);
    let login = client.login(&config.username, &config.password).await;
    tracer.set(config.trace.session);

    let session = login.map_err(|(e, _)| Error::Connect(format!("unable to login: {e}")))?;

    info!("Connected to IMAP server at {}", addr);
    Ok(session)
}

/// Log out, giving the server [`LOGOUT_TIMEOUT`] to acknowledge.
///
/// Failures are logged and otherwise ignored: the session is gone
/// either way once this returns.
pub async fn disconnect(mut session: ImapSession) {
    match tokio::time::timeout(LOGOUT_TIMEOUT, session.logout()).await {
        Ok(Ok(())) => debug!("Logged out"),
        Ok(Err(e)) => warn!("LOGOUT failed: {}", e),
        Err(_) => warn!("LOGOUT timed out after {:?}", LOGOUT_TIMEOUT),
    }
}

/// Certificate verifier that accepts all certificates
/// (for self-signed test servers).
#[derive(Debug)]
struct AcceptAnyCertificate;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
