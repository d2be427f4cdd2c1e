//! Message handler seam.
//!
//! The protocol layer that interprets messages lives outside this crate;
//! it plugs in here.

/// Turns one inbound message into at most one reply.
pub trait MessageHandler<In> {
    type Reply;

    fn handle(&mut self, message: In) -> Option<Self::Reply>;
}

/// Sends every message straight back. Used by the binary and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl MessageHandler<String> for EchoHandler {
    type Reply = String;

    fn handle(&mut self, message: String) -> Option<String> {
        Some(message)
    }
}
