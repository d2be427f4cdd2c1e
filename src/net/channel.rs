//! Duplex message streams over an accepted transport.
//!
//! # Responsibilities
//! - Duplicate the endpoint's input and output descriptors
//! - Wrap each in a framed stream driven by the caller's codec
//! - Report a peer that went away as [`ChannelError::PeerClosed`]
//!
//! # Design Decisions
//! - Each side is built independently; a side that fails is `None`
//! - Sockets are registered with the Tokio reactor; files and pipes fall
//!   back to `tokio::fs::File` (see [`Transport`])
//! - Writing to a closed peer needs `SIGPIPE` ignored; that is a one-time
//!   startup step, see [`crate::lifecycle::signals::ignore_broken_pipe`]

use std::io;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder, FramedRead, FramedWrite, LinesCodecError};

use crate::net::endpoint::TransportEndpoint;
use crate::net::transport::Transport;
use crate::observability::metrics;

/// Errors surfaced by the message streams.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The remote side closed while we were writing.
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("stream I/O error: {0}")]
    Io(io::Error),

    #[error("codec error: {0}")]
    Codec(String),
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => ChannelError::PeerClosed,
            _ => ChannelError::Io(err),
        }
    }
}

impl From<LinesCodecError> for ChannelError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::Io(err) => err.into(),
            LinesCodecError::MaxLineLengthExceeded => {
                ChannelError::Codec("frame exceeds maximum length".to_string())
            }
        }
    }
}

/// Reads protocol frames from the endpoint's input side.
#[derive(Debug)]
pub struct InboundStream<C> {
    frames: FramedRead<Transport, C>,
}

impl<C> InboundStream<C>
where
    C: Decoder + Unpin,
    C::Error: Into<ChannelError>,
{
    fn new(transport: Transport, codec: C) -> Self {
        Self {
            frames: FramedRead::new(transport, codec),
        }
    }

    /// Next frame, or `None` once the peer has finished sending.
    pub async fn recv(&mut self) -> Option<Result<C::Item, ChannelError>> {
        self.frames.next().await.map(|frame| frame.map_err(Into::into))
    }
}

/// Writes protocol frames to the endpoint's output side.
#[derive(Debug)]
pub struct OutboundStream<C> {
    frames: FramedWrite<Transport, C>,
}

impl<C: Unpin> OutboundStream<C> {
    fn new(transport: Transport, codec: C) -> Self {
        Self {
            frames: FramedWrite::new(transport, codec),
        }
    }

    /// Encode and flush one message.
    ///
    /// A peer that already closed its read side yields
    /// [`ChannelError::PeerClosed`] rather than terminating the process.
    pub async fn send<M>(&mut self, message: M) -> Result<(), ChannelError>
    where
        C: Encoder<M>,
        <C as Encoder<M>>::Error: Into<ChannelError>,
    {
        self.frames.send(message).await.map_err(Into::into)
    }
}

/// The inbound/outbound pair for one accepted connection.
#[derive(Debug)]
pub struct MessageStreams<C> {
    pub inbound: Option<InboundStream<C>>,
    pub outbound: Option<OutboundStream<C>>,
}

impl<C> MessageStreams<C> {
    /// Both sides unset. What a rejected connection gets.
    pub fn absent() -> Self {
        Self {
            inbound: None,
            outbound: None,
        }
    }

    /// Only a complete pair may be used for a session.
    pub fn is_usable(&self) -> bool {
        self.inbound.is_some() && self.outbound.is_some()
    }

    pub fn into_parts(self) -> Option<(InboundStream<C>, OutboundStream<C>)> {
        match (self.inbound, self.outbound) {
            (Some(inbound), Some(outbound)) => Some((inbound, outbound)),
            _ => None,
        }
    }
}

impl<C> MessageStreams<C>
where
    C: Decoder + Clone + Unpin,
    C::Error: Into<ChannelError>,
{
    fn assemble(input: io::Result<Transport>, output: io::Result<Transport>, codec: C) -> Self {
        let mut streams = Self::absent();

        match input {
            Ok(transport) => streams.inbound = Some(InboundStream::new(transport, codec.clone())),
            Err(e) => {
                tracing::warn!(error = %e, side = "inbound", "Unable to open message stream");
                metrics::record_channel_failure("inbound");
            }
        }

        match output {
            Ok(transport) => streams.outbound = Some(OutboundStream::new(transport, codec)),
            Err(e) => {
                tracing::warn!(error = %e, side = "outbound", "Unable to open message stream");
                metrics::record_channel_failure("outbound");
            }
        }

        streams
    }
}

/// Build the message streams for an endpoint that passed validation.
///
/// Never rejects; a side whose descriptor cannot be duplicated is left
/// `None` and the caller decides what to do about it.
///
/// Must be called from within a Tokio runtime.
pub fn open_channels<C>(endpoint: &TransportEndpoint, codec: C) -> MessageStreams<C>
where
    C: Decoder + Clone + Unpin,
    C::Error: Into<ChannelError>,
{
    let streams = MessageStreams::assemble(
        Transport::duplicate(endpoint.input()),
        Transport::duplicate(endpoint.output()),
        codec,
    );
    tracing::debug!(
        inbound = streams.inbound.is_some(),
        outbound = streams.outbound.is_some(),
        "Message streams opened"
    );
    streams
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::codec::LinesCodec;

    fn manifest() -> io::Result<Transport> {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
        let file = std::fs::File::open(path)?;
        Ok(tokio::fs::File::from_std(file).into())
    }

    fn exhausted() -> io::Result<Transport> {
        Err(io::Error::from_raw_os_error(nix::libc::EMFILE))
    }

    #[tokio::test]
    async fn test_both_sides_present() {
        let streams = MessageStreams::assemble(manifest(), manifest(), LinesCodec::new());
        assert!(streams.is_usable());
        assert!(streams.into_parts().is_some());
    }

    #[tokio::test]
    async fn test_inbound_failure_leaves_outbound() {
        let streams = MessageStreams::assemble(exhausted(), manifest(), LinesCodec::new());
        assert!(streams.inbound.is_none());
        assert!(streams.outbound.is_some());
        assert!(!streams.is_usable());
    }

    #[tokio::test]
    async fn test_outbound_failure_leaves_inbound() {
        let streams = MessageStreams::assemble(manifest(), exhausted(), LinesCodec::new());
        assert!(streams.inbound.is_some());
        assert!(streams.outbound.is_none());
        assert!(streams.into_parts().is_none());
    }

    #[tokio::test]
    async fn test_both_failures_match_absent() {
        let streams = MessageStreams::assemble(exhausted(), exhausted(), LinesCodec::new());
        assert!(streams.inbound.is_none() && streams.outbound.is_none());
    }

    #[test]
    fn test_broken_pipe_maps_to_peer_closed() {
        let err = ChannelError::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(matches!(err, ChannelError::PeerClosed));

        let err = ChannelError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(matches!(err, ChannelError::PeerClosed));

        let err = ChannelError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ChannelError::Io(_)));
    }

    #[test]
    fn test_line_length_is_codec_error() {
        let err = ChannelError::from(LinesCodecError::MaxLineLengthExceeded);
        assert!(matches!(err, ChannelError::Codec(_)));
    }
}
