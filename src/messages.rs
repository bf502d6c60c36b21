//! Message definitions for communication between the control surface and the mixing server.
//!
//! This module defines the enums that serve as the wire format for messages passed through the
//! outbound ring buffer to the transport, and the raw touch events delivered by the host
//! platform.

use serde::Serialize;

/// Message that is emitted towards the mixing server.
///
/// Serialised as `{"event": "<name>", "data": {...}}`. Event and field names are the
/// integration contract with the server and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ControlMessage {
    /// Set the level of one fader channel.
    ///
    /// # Parameters
    /// * `channel` - Control channel on the mixer
    /// * `value` - Fader value (0 to 1023)
    #[serde(rename = "updateFader")]
    UpdateFader { channel: u32, value: u16 },

    /// Move the virtual sound source, in venue meters (origin bottom-left).
    #[serde(rename = "updateSource")]
    UpdateSource { x: f64, y: f64 },

    /// Mute or unmute one fader channel.
    #[serde(rename = "updateMute")]
    UpdateMute { channel: u32, mute: bool },
}

impl ControlMessage {
    /// Event name used on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::UpdateFader { .. } => "updateFader",
            Self::UpdateSource { .. } => "updateSource",
            Self::UpdateMute { .. } => "updateMute",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Phase of a raw touch event, as delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    /// The platform terminated the gesture without a release.
    Cancel,
}

impl TouchPhase {
    /// Parses the phase names used by host shells (`"start"`, `"move"`, `"end"`, `"cancel"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "start" | "grant" | "down" => Some(Self::Start),
            "move" => Some(Self::Move),
            "end" | "release" | "up" => Some(Self::End),
            "cancel" | "terminate" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// One raw touch event in floor-plan viewport coordinates (pixels, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub x: f64,
    pub y: f64,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, x: f64, y: f64) -> Self {
        Self { phase, x, y }
    }
}
