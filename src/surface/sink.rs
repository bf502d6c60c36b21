//! Outbound message plumbing.
//!
//! This module handles the boundary towards the transport that owns the connection to the
//! mixing server:
//! - Logger setup
//! - The ring buffer carrying [`ControlMessage`]s out of the surface
//! - The fire-and-forget [`MessageSink`] the surface sends through

use env_logger::{Builder, Env};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::messages::ControlMessage;

/// Anything the surface can hand a control message to.
///
/// Sending never blocks and never reports failure; a transport that cannot deliver simply
/// drops the message.
pub trait MessageSink: Send {
    fn send(&mut self, message: ControlMessage);
}

impl MessageSink for Producer<ControlMessage> {
    fn send(&mut self, message: ControlMessage) {
        if self.push(message).is_err() {
            log::warn!(
                "Outbound buffer full, dropping {} message",
                message.event_name()
            );
        }
    }
}

/// Setup and configure the logger for surface operations
pub fn setup_logger() {
    // Users can override via `RUST_LOG`, e.g. `RUST_LOG=debug` to see every sent message.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(()); // Ignore initialization errors
}

/// Creates the ring buffer between the surface (producer) and the transport (consumer).
pub fn outbound_channel(
    capacity: usize,
) -> (Producer<ControlMessage>, Consumer<ControlMessage>) {
    RingBuffer::new(capacity.max(1))
}
