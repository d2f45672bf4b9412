//! Audio Engine Module
//!
//! This module provides the real-time mono/stereo mixing engine.
//! It is organized into sub-modules, each with a specific responsibility:
//!
//! - [`params`]: Lock-free parameter store shared with the audio thread
//! - [`processor`]: Per-block gain, downmix and pan processing
//! - [`state`]: Persisted parameter state encoding
//! - [`audio_stream`]: CPAL stream management and real-time callback
//! - [`constants`]: Parameter ranges, defaults and stream limits
//! - [`errors`]: Audio-specific error types
//!
//! The main [`MonoStereoEngine`] struct ties these together and exposes the
//! parameter surface, state persistence and stream lifecycle to Python.

use crate::audio_engine::audio_stream::{
    AudioStreamHandle, StreamSettings, create_audio_stream, start_streams,
};
use crate::audio_engine::constants::DEFAULT_BLOCK_SIZE;
use crate::audio_engine::params::{ParamId, ParamSnapshot, ParamStore};
use crate::messages::{AudioMessage, ControlMessage};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

mod audio_stream;
pub mod constants;
pub mod errors;
pub mod params;
pub mod processor;
pub mod state;

fn param_for_key(key: &str) -> PyResult<ParamId> {
    ParamId::from_key(key).ok_or_else(|| {
        PyValueError::new_err(format!(
            "unknown parameter {key:?} (expected one of: mode, volume, pan)"
        ))
    })
}

/// MonoStereoEngine mixes live stereo input to mono or pans it in stereo.
#[pyclass]
pub struct MonoStereoEngine {
    params: Arc<ParamStore>,
    settings: StreamSettings,
    stream_handle: Option<AudioStreamHandle>,
}

#[pymethods]
impl MonoStereoEngine {
    /// Create a new MonoStereoEngine with default parameter values.
    #[new]
    #[pyo3(signature = (block_size = DEFAULT_BLOCK_SIZE))]
    pub fn new(block_size: u32) -> PyResult<Self> {
        if block_size == 0 {
            return Err(PyValueError::new_err("block_size must be greater than zero"));
        }

        Ok(MonoStereoEngine {
            params: Arc::new(ParamStore::new()),
            settings: StreamSettings { block_size },
            stream_handle: None,
        })
    }

    /// Initialize and run the audio engine.
    pub fn run(&mut self) -> PyResult<()> {
        if self.stream_handle.is_some() {
            return Err(PyRuntimeError::new_err("MonoStereoEngine already running"));
        }

        match create_audio_stream(self.settings, self.params.clone()) {
            Ok(handle) => {
                start_streams(&handle).map_err(|e| {
                    PyRuntimeError::new_err(format!("Failed to start audio stream: {e}"))
                })?;
                self.stream_handle = Some(handle);
                Ok(())
            }
            Err(e) => Err(PyRuntimeError::new_err(format!(
                "Failed to create audio stream: {e}"
            ))),
        }
    }

    /// Shut down the audio engine.
    pub fn shut_down(&mut self) -> PyResult<()> {
        self.stream_handle = None;
        Ok(())
    }

    /// Whether the streams are running.
    pub fn is_running(&self) -> bool {
        self.stream_handle.is_some()
    }

    /// Negotiated `(input_channels, output_channels, sample_rate)` while running.
    pub fn stream_info(&self) -> Option<(usize, usize, u32)> {
        self.stream_handle.as_ref().map(|handle| {
            (
                handle.input_channels,
                handle.output_channels,
                handle.sample_rate,
            )
        })
    }

    /// Read a parameter by key.
    pub fn get_param(&self, key: &str) -> PyResult<f32> {
        Ok(self.params.get(param_for_key(key)?))
    }

    /// Write a parameter by key. Out-of-range values are clamped.
    pub fn set_param(&self, key: &str, value: f32) -> PyResult<()> {
        self.params.set(param_for_key(key)?, value);
        Ok(())
    }

    /// Current values of all parameters.
    pub fn snapshot(&self) -> HashMap<String, f32> {
        self.params.snapshot_all().into_iter().collect()
    }

    /// Restore parameters from a mapping. Missing keys keep their value.
    ///
    /// Returns the number of parameters written.
    pub fn restore(&self, values: HashMap<String, f32>) -> usize {
        let snapshot: ParamSnapshot = values.into_iter().collect();
        self.params.restore_all(&snapshot)
    }

    /// Serialize the current parameters for session persistence.
    pub fn get_state(&self) -> Vec<u8> {
        state::encode(&self.params.snapshot_all())
    }

    /// Restore parameters from a blob produced by `get_state`.
    ///
    /// Malformed or foreign data leaves every parameter untouched and returns False.
    pub fn set_state(&self, data: &[u8]) -> bool {
        state::restore_state(&self.params, data)
    }

    /// Parameter metadata as `(key, name, min, max, default)` tuples.
    pub fn parameters(&self) -> Vec<(&'static str, &'static str, f32, f32, f32)> {
        ParamId::ALL
            .into_iter()
            .map(|id| {
                let (min, max) = id.range();
                (id.key(), id.name(), min, max, id.default_value())
            })
            .collect()
    }

    /// Send a ping message to the audio thread.
    pub fn ping(&mut self) -> PyResult<()> {
        let handle = self
            .stream_handle
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("Audio engine not initialized"))?;

        let mut producer_guard = handle
            .producer
            .lock()
            .map_err(|_| PyRuntimeError::new_err("Failed to acquire producer lock"))?;

        producer_guard
            .push(ControlMessage::Ping())
            .map_err(|_| PyRuntimeError::new_err("Failed to send Ping - buffer may be full"))
    }

    /// Receive a message from the audio thread.
    pub fn receive_msg(&mut self) -> PyResult<Option<AudioMessage>> {
        let handle = self
            .stream_handle
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("Audio engine not initialized"))?;

        let mut consumer_guard = handle
            .consumer
            .lock()
            .map_err(|_| PyRuntimeError::new_err("Failed to acquire consumer lock"))?;

        match consumer_guard.pop() {
            Ok(msg) => Ok(Some(msg)),
            Err(_) => Ok(None),
        }
    }
}
