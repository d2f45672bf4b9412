use pyo3::pymodule;

pub mod audio_engine;
pub mod messages;

/// The Python module implemented in Rust.
#[pymodule]
mod mono_stereo_audio {
    #[pymodule_export]
    use super::audio_engine::MonoStereoEngine;

    #[pymodule_export]
    use super::messages::AudioMessage;
}
