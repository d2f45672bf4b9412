//! Audio Stream Module
//!
//! This module handles CPAL stream management including:
//! - Opening the default input and output devices
//! - Forwarding captured frames to the output callback through a lock-free ring
//! - Running the block processor in the real-time output callback
//! - Real-time message processing

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Stream, StreamConfig};
use env_logger::{Builder, Env};
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::{Arc, Mutex};

use crate::audio_engine::constants::{INPUT_RING_BLOCKS, MAX_CHANNELS, MESSAGE_QUEUE_CAPACITY};
use crate::audio_engine::errors::StreamError;
use crate::audio_engine::params::ParamStore;
use crate::audio_engine::processor::process_interleaved;
use crate::messages::{AudioMessage, ControlMessage};

/// Runtime stream options.
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    /// Frames per callback requested from the backend.
    pub block_size: u32,
}

/// Handle to the running streams with associated message channels
pub struct AudioStreamHandle {
    pub input_stream: Stream,
    pub output_stream: Stream,
    pub producer: Arc<Mutex<Producer<ControlMessage>>>,
    pub consumer: Arc<Mutex<Consumer<AudioMessage>>>,
    /// Channels forwarded from the input device (never more than `output_channels`).
    pub input_channels: usize,
    pub output_channels: usize,
    pub sample_rate: u32,
}

/// Setup and configure the logger for audio operations
pub fn setup_logger() {
    // Users can override via `RUST_LOG`, e.g. `RUST_LOG=debug` when troubleshooting.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(()); // Ignore initialization errors
}

/// Create and configure the duplex audio stream
///
/// This function:
/// 1. Opens the default input and output devices
/// 2. Caps the output at two channels and opens the input at the output rate
/// 3. Creates ring buffers for captured audio and message passing
/// 4. Builds both streams; the output callback runs the block processor
///
/// The streams are returned paused; see [`start_streams`].
pub fn create_audio_stream(
    settings: StreamSettings,
    params: Arc<ParamStore>,
) -> Result<AudioStreamHandle, StreamError> {
    setup_logger();

    let host = cpal::default_host();
    let output_device = host
        .default_output_device()
        .ok_or(StreamError::NoOutputDevice)?;
    let input_device = host
        .default_input_device()
        .ok_or(StreamError::NoInputDevice)?;

    let output_config = output_device.default_output_config()?;
    let input_config = input_device.default_input_config()?;

    let sample_rate = output_config.sample_rate();
    let output_channels = output_config.channels().min(MAX_CHANNELS as u16);
    let capture_channels = input_config.channels();
    let input_channels = capture_channels.min(output_channels) as usize;

    log::info!(
        "Starting MonoStereoEngine... ({} in / {} out @ {} Hz, block {})",
        input_channels,
        output_channels,
        sample_rate,
        settings.block_size
    );

    // Captured audio (input callback -> output callback)
    let ring_len = settings.block_size as usize * INPUT_RING_BLOCKS * input_channels.max(1);
    let (mut sample_tx, mut sample_rx) = RingBuffer::<f32>::new(ring_len);

    // Create ring buffer for incoming messages (Python->Rust)
    let (producer_in, mut consumer_in) = RingBuffer::new(MESSAGE_QUEUE_CAPACITY);

    // Create ring buffer for outgoing messages (Rust->Python)
    let (mut producer_out, consumer_out) = RingBuffer::new(MESSAGE_QUEUE_CAPACITY);

    let input_stream_config = StreamConfig {
        channels: capture_channels,
        sample_rate,
        buffer_size: BufferSize::Fixed(settings.block_size),
    };
    let output_stream_config = StreamConfig {
        channels: output_channels,
        sample_rate,
        buffer_size: BufferSize::Fixed(settings.block_size),
    };

    let capture_width = capture_channels as usize;
    let input_stream = input_device.build_input_stream(
        &input_stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            push_captured(data, capture_width, input_channels, &mut sample_tx);
        },
        |err| {
            log::error!("Audio input stream error: {}", err);
        },
        None,
    )?;

    let output_width = output_channels as usize;
    let output_stream = output_device.build_output_stream(
        &output_stream_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            // Process incoming messages in real-time
            while let Ok(message) = consumer_in.pop() {
                match message {
                    ControlMessage::Ping() => {
                        let _ = producer_out.push(AudioMessage::Pong());
                    }
                }
            }

            pull_captured(data, output_width, input_channels, &mut sample_rx);
            process_interleaved(data, output_width, input_channels, &params);

            let (left, right) = block_peaks(data, output_width);
            let _ = producer_out.push(AudioMessage::OutputPeak { left, right });
        },
        |err| {
            log::error!("Audio output stream error: {}", err);
        },
        None,
    )?;

    Ok(AudioStreamHandle {
        input_stream,
        output_stream,
        producer: Arc::new(Mutex::new(producer_in)),
        consumer: Arc::new(Mutex::new(consumer_out)),
        input_channels,
        output_channels: output_width,
        sample_rate,
    })
}

/// Start playing both streams
pub fn start_streams(handle: &AudioStreamHandle) -> Result<(), StreamError> {
    handle.input_stream.play()?;
    handle.output_stream.play()?;
    Ok(())
}

/// Queues the first `input_channels` of every captured frame.
///
/// Frames that do not fit are dropped whole so the ring never holds a partial frame.
fn push_captured(
    data: &[f32],
    capture_channels: usize,
    input_channels: usize,
    tx: &mut Producer<f32>,
) {
    if capture_channels == 0 || input_channels == 0 {
        return;
    }

    for frame in data.chunks_exact(capture_channels) {
        if tx.slots() < input_channels {
            return;
        }
        for &sample in &frame[..input_channels] {
            let _ = tx.push(sample);
        }
    }
}

/// Fills the input slots of every output frame from the capture ring.
///
/// On underrun the remaining frames are silent.
fn pull_captured(
    data: &mut [f32],
    output_channels: usize,
    input_channels: usize,
    rx: &mut Consumer<f32>,
) {
    if output_channels == 0 {
        return;
    }

    let input_channels = input_channels.min(output_channels);
    for frame in data.chunks_exact_mut(output_channels) {
        let inputs = &mut frame[..input_channels];
        if rx.slots() < input_channels {
            inputs.fill(0.0);
            continue;
        }
        for slot in inputs {
            *slot = rx.pop().unwrap_or(0.0);
        }
    }
}

/// Peak magnitude of the first two channels; a mono block reports the same peak twice.
fn block_peaks(data: &[f32], channels: usize) -> (f32, f32) {
    if channels == 0 {
        return (0.0, 0.0);
    }

    let mut left = 0.0_f32;
    let mut right = 0.0_f32;
    for frame in data.chunks_exact(channels) {
        left = left.max(frame[0].abs());
        right = right.max(frame.get(1).unwrap_or(&frame[0]).abs());
    }
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::constants::DEFAULT_BLOCK_SIZE;
    use crate::audio_engine::params::ParamId;

    #[test]
    fn test_logger_setup() {
        // Multiple calls should be safe (though only the first takes effect)
        setup_logger();
        setup_logger();
    }

    #[test]
    fn test_push_then_pull_stereo() {
        let (mut tx, mut rx) = RingBuffer::<f32>::new(16);
        push_captured(&[0.1, 0.2, 0.3, 0.4], 2, 2, &mut tx);

        let mut out = vec![9.0_f32; 4];
        pull_captured(&mut out, 2, 2, &mut rx);

        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_push_drops_extra_capture_channels() {
        let (mut tx, mut rx) = RingBuffer::<f32>::new(16);
        // Four-channel capture, only the first two are forwarded.
        push_captured(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 4, 2, &mut tx);

        let mut out = vec![0.0_f32; 4];
        pull_captured(&mut out, 2, 2, &mut rx);

        assert_eq!(out, vec![1.0, 2.0, 5.0, 6.0]);
    }

    #[test]
    fn test_push_drops_whole_frames_when_full() {
        let (mut tx, mut rx) = RingBuffer::<f32>::new(3);
        push_captured(&[0.1, 0.2, 0.3, 0.4], 2, 2, &mut tx);

        assert_eq!(rx.slots(), 2);
        let mut out = vec![0.0_f32; 4];
        pull_captured(&mut out, 2, 2, &mut rx);
        assert_eq!(out, vec![0.1, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn test_pull_underrun_is_silence() {
        let (_tx, mut rx) = RingBuffer::<f32>::new(8);

        let mut out = vec![0.7_f32; 6];
        pull_captured(&mut out, 2, 2, &mut rx);

        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_pull_mono_into_stereo_then_process() {
        let (mut tx, mut rx) = RingBuffer::<f32>::new(8);
        push_captured(&[0.8, -0.4], 1, 1, &mut tx);

        let params = ParamStore::new();
        params.set(ParamId::Volume, 0.5);

        let mut out = vec![0.9_f32; 4];
        pull_captured(&mut out, 2, 1, &mut rx);
        process_interleaved(&mut out, 2, 1, &params);

        assert_eq!(out, vec![0.4, 0.0, -0.2, 0.0]);
    }

    #[test]
    fn test_block_peaks() {
        assert_eq!(block_peaks(&[0.1, -0.5, -0.3, 0.2], 2), (0.3, 0.5));
        assert_eq!(block_peaks(&[0.1, -0.6, 0.2], 1), (0.6, 0.6));
        assert_eq!(block_peaks(&[], 2), (0.0, 0.0));
    }

    #[test]
    fn test_audio_stream_creation() {
        // Actual stream creation requires audio hardware
        let host = cpal::default_host();
        if host.default_output_device().is_none() || host.default_input_device().is_none() {
            return; // Skip test if no audio device available
        }

        let settings = StreamSettings {
            block_size: DEFAULT_BLOCK_SIZE,
        };
        // Expected to fail in many test environments; only the signature matters here.
        let _ = create_audio_stream(settings, Arc::new(ParamStore::new()));
    }
}
