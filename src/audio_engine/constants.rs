//! Audio engine configuration constants and limits.

/// Minimum mode value (mono).
pub const MODE_MIN: f32 = 0.0;

/// Maximum mode value (stereo).
pub const MODE_MAX: f32 = 1.0;

/// Default mode (mono).
pub const MODE_DEFAULT: f32 = 0.0;

/// Mode values at or above this threshold select stereo processing.
pub const STEREO_THRESHOLD: f32 = 0.5;

/// Minimum volume level (silence).
pub const VOLUME_MIN: f32 = 0.0;

/// Maximum volume level (100%).
pub const VOLUME_MAX: f32 = 1.0;

/// Default volume level.
pub const VOLUME_DEFAULT: f32 = 0.7;

/// Hard left.
pub const PAN_MIN: f32 = -1.0;

/// Hard right.
pub const PAN_MAX: f32 = 1.0;

/// Centre.
pub const PAN_DEFAULT: f32 = 0.0;

/// Highest channel count the processor handles.
pub const MAX_CHANNELS: usize = 2;

/// Frames per audio callback requested from the backend.
pub const DEFAULT_BLOCK_SIZE: u32 = 512;

/// Capacity of the control/message ring buffers.
pub const MESSAGE_QUEUE_CAPACITY: usize = 1024;

/// Number of blocks of captured audio the input → output ring can hold.
pub const INPUT_RING_BLOCKS: usize = 8;

/// Tag identifying a persisted parameter document.
pub const STATE_TAG: &str = "PARAMETERS";

/// Current persisted state schema version.
pub const STATE_VERSION: u32 = 1;
