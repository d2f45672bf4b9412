//! Per-block mono/stereo processing.
//!
//! Every block runs three stages in a fixed order:
//!
//! 1. output channels beyond the input channel count are silenced,
//! 2. every input channel is scaled by `volume`,
//! 3. with exactly two inputs and two outputs, the pair is either averaged to
//!    mono or balanced with a linear pan law, depending on `mode`.
//!
//! Parameters are read once per block and held for its whole length. Nothing
//! here allocates, locks or touches I/O, so both entry points are safe to call
//! from the audio callback.

use cpal::Sample;

use crate::audio_engine::params::{BlockParams, ParamStore, is_stereo};

/// Linear pan law: `(left_gain, right_gain)` for a pan value in [-1, 1].
///
/// Centre leaves both channels at unity; panning only ever attenuates the
/// opposite side.
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let left_gain = 1.0 - pan.max(0.0);
    let right_gain = 1.0 - (-pan).max(0.0);
    (left_gain, right_gain)
}

/// Processes a planar block in place using the store's current values.
///
/// `buffer` holds one slice per channel. Channel and sample counts larger than
/// the buffer are truncated to what it actually holds.
pub fn process_block(
    buffer: &mut [&mut [f32]],
    num_input_channels: usize,
    num_output_channels: usize,
    num_samples: usize,
    params: &ParamStore,
) {
    process_block_with(
        buffer,
        num_input_channels,
        num_output_channels,
        num_samples,
        params.block_params(),
    );
}

/// Planar processing with an explicit parameter snapshot.
pub fn process_block_with(
    buffer: &mut [&mut [f32]],
    num_input_channels: usize,
    num_output_channels: usize,
    num_samples: usize,
    params: BlockParams,
) {
    let num_output_channels = num_output_channels.min(buffer.len());
    let num_input_channels = num_input_channels.min(buffer.len());

    for channel in buffer
        .iter_mut()
        .take(num_output_channels)
        .skip(num_input_channels)
    {
        for sample in channel.iter_mut().take(num_samples) {
            *sample = Sample::EQUILIBRIUM;
        }
    }

    let volume = params.volume;
    for channel in buffer.iter_mut().take(num_input_channels) {
        for sample in channel.iter_mut().take(num_samples) {
            *sample *= volume;
        }
    }

    if num_input_channels != 2 || num_output_channels != 2 {
        return;
    }

    let [left, right, ..] = buffer else {
        return;
    };

    let frames = left.iter_mut().zip(right.iter_mut()).take(num_samples);
    if is_stereo(params.mode) {
        let (left_gain, right_gain) = pan_gains(params.pan);
        for (l, r) in frames {
            *l *= left_gain;
            *r *= right_gain;
        }
    } else {
        for (l, r) in frames {
            let mono = (*l + *r) * 0.5;
            *l = mono;
            *r = mono;
        }
    }
}

/// Processes an interleaved block in place.
///
/// `channels` is the frame width of `data` (the output channel count); the
/// first `num_input_channels` slots of each frame carry input audio.
pub fn process_interleaved(
    data: &mut [f32],
    channels: usize,
    num_input_channels: usize,
    params: &ParamStore,
) {
    process_interleaved_with(data, channels, num_input_channels, params.block_params());
}

/// Interleaved processing with an explicit parameter snapshot.
pub fn process_interleaved_with(
    data: &mut [f32],
    channels: usize,
    num_input_channels: usize,
    params: BlockParams,
) {
    if channels == 0 {
        return;
    }

    let num_input_channels = num_input_channels.min(channels);
    let volume = params.volume;
    let mix_pair = num_input_channels == 2 && channels == 2;
    let stereo = is_stereo(params.mode);
    let (left_gain, right_gain) = pan_gains(params.pan);

    for frame in data.chunks_exact_mut(channels) {
        frame[num_input_channels..].fill(Sample::EQUILIBRIUM);

        for sample in &mut frame[..num_input_channels] {
            *sample *= volume;
        }

        if !mix_pair {
            continue;
        }

        if stereo {
            frame[0] *= left_gain;
            frame[1] *= right_gain;
        } else {
            let mono = (frame[0] + frame[1]) * 0.5;
            frame[0] = mono;
            frame[1] = mono;
        }
    }
}
