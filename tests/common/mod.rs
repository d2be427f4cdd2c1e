//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use connection_gate::net::{AddressSource, EndpointAddress, ResolveError, TransportEndpoint};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with every tracing event written to a buffer, and return both.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    capture_logs_at(tracing::Level::TRACE, f)
}

/// Like [`capture_logs`], but drops events more verbose than `level`, the
/// way a production filter would.
pub fn capture_logs_at<T>(level: tracing::Level, f: impl FnOnce() -> T) -> (T, String) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(level)
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);
    (out, capture.contents())
}

/// Address source with canned answers, for networks the test host lacks.
pub struct FakeEndpoint {
    local: Result<EndpointAddress, ResolveError>,
    peer: Result<EndpointAddress, ResolveError>,
    pub peer_lookups: Cell<u32>,
}

impl FakeEndpoint {
    pub fn new(
        local: Result<EndpointAddress, ResolveError>,
        peer: Result<EndpointAddress, ResolveError>,
    ) -> Self {
        Self {
            local,
            peer,
            peer_lookups: Cell::new(0),
        }
    }

    pub fn ipv4(local: Ipv4Addr, peer: Ipv4Addr) -> Self {
        Self::new(
            Ok(EndpointAddress::Ipv4(local)),
            Ok(EndpointAddress::Ipv4(peer)),
        )
    }
}

impl AddressSource for FakeEndpoint {
    fn local_address(&self) -> Result<EndpointAddress, ResolveError> {
        self.local
    }

    fn peer_address(&self) -> Result<EndpointAddress, ResolveError> {
        self.peer_lookups.set(self.peer_lookups.get() + 1);
        self.peer
    }
}

/// The crate manifest opened read-only; a convenient non-socket transport.
pub fn manifest_file() -> std::fs::File {
    std::fs::File::open(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml")).unwrap()
}

/// An accepted loopback connection: the server side as an endpoint and
/// the client side as a Tokio stream.
pub async fn loopback_endpoint() -> (TransportEndpoint, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap())
        .await
        .unwrap();
    let (server, _) = listener.accept().await.unwrap();

    let endpoint = TransportEndpoint::from_tcp(server.into_std().unwrap()).unwrap();
    (endpoint, client)
}
