//! Lock-free parameter storage shared between the UI and the audio thread.
//!
//! Every parameter lives in its own [`AtomicF32`] cell. Reads on the audio
//! thread never block and never observe a torn value, but there is no
//! transaction across cells: a block may see `volume` from one write and `pan`
//! from the next.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::audio_engine::constants::{
    MODE_DEFAULT, MODE_MAX, MODE_MIN, PAN_DEFAULT, PAN_MAX, PAN_MIN, STEREO_THRESHOLD,
    VOLUME_DEFAULT, VOLUME_MAX, VOLUME_MIN,
};

/// Point-in-time copy of parameter values keyed by parameter key.
pub type ParamSnapshot = BTreeMap<String, f32>;

/// Thread-safe f32 cell stored as raw bits in an [`AtomicU32`].
#[derive(Debug)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// The three parameters exposed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Mode,
    Volume,
    Pan,
}

impl ParamId {
    /// All parameters in declaration order.
    pub const ALL: [ParamId; 3] = [ParamId::Mode, ParamId::Volume, ParamId::Pan];

    /// Stable key used by the UI and the persisted state.
    pub fn key(self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::Volume => "volume",
            Self::Pan => "pan",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Mode => "Mode",
            Self::Volume => "Volume",
            Self::Pan => "Pan",
        }
    }

    pub fn range(self) -> (f32, f32) {
        match self {
            Self::Mode => (MODE_MIN, MODE_MAX),
            Self::Volume => (VOLUME_MIN, VOLUME_MAX),
            Self::Pan => (PAN_MIN, PAN_MAX),
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            Self::Mode => MODE_DEFAULT,
            Self::Volume => VOLUME_DEFAULT,
            Self::Pan => PAN_DEFAULT,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }

    fn index(self) -> usize {
        match self {
            Self::Mode => 0,
            Self::Volume => 1,
            Self::Pan => 2,
        }
    }

    fn contains(self, value: f32) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&value)
    }
}

/// Returns true when a `mode` value selects stereo processing.
pub fn is_stereo(mode: f32) -> bool {
    mode >= STEREO_THRESHOLD
}

/// Parameter values read once at the start of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockParams {
    pub mode: f32,
    pub volume: f32,
    pub pan: f32,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self {
            mode: MODE_DEFAULT,
            volume: VOLUME_DEFAULT,
            pan: PAN_DEFAULT,
        }
    }
}

/// Holds the current value of every parameter.
///
/// Created once with defaults and shared (via `Arc`) between the audio
/// callback and the control side for the lifetime of the engine.
#[derive(Debug)]
pub struct ParamStore {
    values: [AtomicF32; 3],
}

impl ParamStore {
    pub fn new() -> Self {
        Self {
            values: ParamId::ALL.map(|id| AtomicF32::new(id.default_value())),
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()].load()
    }

    /// Stores `value` clamped to the parameter's range.
    ///
    /// NaN is ignored and leaves the current value untouched.
    pub fn set(&self, id: ParamId, value: f32) {
        if value.is_nan() {
            return;
        }

        let (min, max) = id.range();
        self.values[id.index()].store(value.clamp(min, max));
    }

    /// Reads a parameter by key.
    ///
    /// Unknown keys are an integration error: they panic in debug builds and
    /// read as `0.0` otherwise.
    pub fn get_by_key(&self, key: &str) -> f32 {
        match ParamId::from_key(key) {
            Some(id) => self.get(id),
            None => {
                debug_assert!(false, "unknown parameter key {key:?}");
                0.0
            }
        }
    }

    /// Writes a parameter by key. Unknown keys are handled as in [`Self::get_by_key`].
    pub fn set_by_key(&self, key: &str, value: f32) {
        match ParamId::from_key(key) {
            Some(id) => self.set(id, value),
            None => debug_assert!(false, "unknown parameter key {key:?}"),
        }
    }

    /// Reads all three parameters for one block.
    pub fn block_params(&self) -> BlockParams {
        BlockParams {
            mode: self.get(ParamId::Mode),
            volume: self.get(ParamId::Volume),
            pan: self.get(ParamId::Pan),
        }
    }

    pub fn snapshot_all(&self) -> ParamSnapshot {
        ParamId::ALL
            .into_iter()
            .map(|id| (id.key().to_string(), self.get(id)))
            .collect()
    }

    /// Overwrites every known parameter present in `snapshot` whose value is in range.
    ///
    /// Missing keys keep their current value; unknown keys and out-of-range
    /// values are skipped. Returns the number of parameters written.
    pub fn restore_all(&self, snapshot: &ParamSnapshot) -> usize {
        let mut restored = 0;
        for id in ParamId::ALL {
            let Some(&value) = snapshot.get(id.key()) else {
                continue;
            };

            if !id.contains(value) {
                log::debug!(
                    "restore_all: skipping {}={} (outside {:?})",
                    id.key(),
                    value,
                    id.range()
                );
                continue;
            }

            self.values[id.index()].store(value);
            restored += 1;
        }
        restored
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}
