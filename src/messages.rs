//! Message definitions for communication between Python and the Rust audio thread.
//!
//! These enums are the wire format of the ring buffers between the control
//! side and the real-time output callback. Parameter values do not travel
//! through here; they are shared directly through the atomic parameter store.

use pyo3::prelude::*;

/// Message that is emitted from the audio thread.
#[derive(Debug, Clone, PartialEq)]
#[pyclass]
pub enum AudioMessage {
    /// Response to a Ping message.
    Pong(),

    /// Output peak levels of the last processed block (post gain/mix).
    OutputPeak { left: f32, right: f32 },
}

#[pymethods]
impl AudioMessage {
    pub fn output_peak(&self) -> Option<(f32, f32)> {
        match self {
            AudioMessage::OutputPeak { left, right } => Some((*left, *right)),
            _ => None,
        }
    }

    pub fn is_pong(&self) -> bool {
        matches!(self, AudioMessage::Pong())
    }
}

/// Message that is emitted from the Python side.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// Used for testing message passing functionality.
    Ping(),
}
