//! Persisted parameter state.
//!
//! The host stores an opaque blob between sessions. The blob is a small
//! tagged JSON document:
//!
//! ```text
//! {"tag":"PARAMETERS","version":1,"params":{"mode":0.0,"pan":0.0,"volume":0.7}}
//! ```
//!
//! Parameters are keyed by name, so documents written with more (or fewer)
//! parameters still decode; unknown keys are carried through and ignored when
//! restoring. Entries under `params` that are not numbers (`null`, strings,
//! nested values) are dropped individually instead of rejecting the document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audio_engine::constants::{STATE_TAG, STATE_VERSION};
use crate::audio_engine::errors::StateDecodeError;
use crate::audio_engine::params::{ParamSnapshot, ParamStore};

#[derive(Debug, Serialize)]
struct StateDocumentRef<'a> {
    tag: &'a str,
    version: u32,
    params: &'a ParamSnapshot,
}

#[derive(Debug, Deserialize)]
struct StateDocument {
    tag: String,
    version: u32,
    params: BTreeMap<String, Value>,
}

/// Serializes a snapshot into a state blob.
///
/// Output is deterministic: parameters are written in key order.
pub fn encode(snapshot: &ParamSnapshot) -> Vec<u8> {
    let document = StateDocumentRef {
        tag: STATE_TAG,
        version: STATE_VERSION,
        params: snapshot,
    };

    // A map of f32 keyed by strings always serializes; non-finite values become `null`.
    serde_json::to_vec(&document).unwrap_or_default()
}

/// Decodes a state blob, returning `None` for empty, malformed or foreign data.
pub fn decode(bytes: &[u8]) -> Option<ParamSnapshot> {
    if bytes.is_empty() {
        return None;
    }

    match try_decode(bytes) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            log::warn!("decode: ignoring persisted state: {}", err);
            None
        }
    }
}

fn try_decode(bytes: &[u8]) -> Result<ParamSnapshot, StateDecodeError> {
    let document: StateDocument = serde_json::from_slice(bytes)?;

    if document.tag != STATE_TAG {
        return Err(StateDecodeError::TagMismatch {
            found: document.tag,
        });
    }

    if document.version == 0 {
        return Err(StateDecodeError::UnsupportedVersion(document.version));
    }

    let snapshot = document
        .params
        .into_iter()
        .filter_map(|(key, value)| match value.as_f64() {
            Some(number) => Some((key, number as f32)),
            None => {
                log::debug!("decode: skipping non-numeric parameter {}={}", key, value);
                None
            }
        })
        .collect();

    Ok(snapshot)
}

/// Decodes `bytes` and restores the result into `store`.
///
/// Nothing is written unless the whole blob decodes. Returns whether state
/// was applied.
pub fn restore_state(store: &ParamStore, bytes: &[u8]) -> bool {
    let Some(snapshot) = decode(bytes) else {
        return false;
    };

    let restored = store.restore_all(&snapshot);
    log::debug!("restore_state: restored {} parameter(s)", restored);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::params::ParamId;

    fn sample_snapshot() -> ParamSnapshot {
        let store = ParamStore::new();
        store.set(ParamId::Mode, 1.0);
        store.set(ParamId::Volume, 0.35);
        store.set(ParamId::Pan, -0.6);
        store.snapshot_all()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let snapshot = sample_snapshot();

        let decoded = decode(&encode(&snapshot)).unwrap();

        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let snapshot = sample_snapshot();
        assert_eq!(encode(&snapshot), encode(&snapshot));
    }

    #[test]
    fn test_encode_layout() {
        let snapshot = ParamStore::new().snapshot_all();
        let text = String::from_utf8(encode(&snapshot)).unwrap();

        assert_eq!(
            text,
            r#"{"tag":"PARAMETERS","version":1,"params":{"mode":0.0,"pan":0.0,"volume":0.7}}"#
        );
    }

    #[test]
    fn test_decode_empty_is_none() {
        assert!(decode(&[]).is_none());
    }

    #[test]
    fn test_decode_garbage_is_none() {
        assert!(decode(b"\x00\x01not json at all").is_none());
        assert!(decode(b"{\"tag\":\"PARAMETERS\"").is_none());
        assert!(decode(b"[1, 2, 3]").is_none());
    }

    #[test]
    fn test_decode_foreign_tag_is_none() {
        let blob = br#"{"tag":"OTHER_PLUGIN","version":1,"params":{"volume":0.1}}"#;
        assert!(decode(blob).is_none());
    }

    #[test]
    fn test_decode_version_zero_is_none() {
        let blob = br#"{"tag":"PARAMETERS","version":0,"params":{"volume":0.1}}"#;
        assert!(decode(blob).is_none());
    }

    #[test]
    fn test_decode_newer_document_with_extra_keys() {
        let blob = br#"{"tag":"PARAMETERS","version":3,"params":{"volume":0.4,"width":0.9},"extra":true}"#;

        let snapshot = decode(blob).unwrap();

        assert_eq!(snapshot["volume"], 0.4);
        assert_eq!(snapshot["width"], 0.9);
    }

    #[test]
    fn test_decode_skips_non_numeric_entries() {
        let blob = br#"{"tag":"PARAMETERS","version":2,"params":{"curve":"linear","pan":null,"volume":0.4}}"#;

        let snapshot = decode(blob).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["volume"], 0.4);
    }

    #[test]
    fn test_non_finite_value_does_not_poison_document() {
        let mut snapshot = ParamStore::new().snapshot_all();
        snapshot.insert("pan".to_string(), f32::NAN);

        let decoded = decode(&encode(&snapshot)).unwrap();

        assert!(!decoded.contains_key("pan"));
        assert_eq!(decoded["mode"], 0.0);
        assert!((decoded["volume"] - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_restore_state_applies_valid_blob() {
        let store = ParamStore::new();
        let blob = encode(&sample_snapshot());

        assert!(restore_state(&store, &blob));

        assert_eq!(store.get(ParamId::Mode), 1.0);
        assert_eq!(store.get(ParamId::Volume), 0.35);
        assert_eq!(store.get(ParamId::Pan), -0.6);
    }

    #[test]
    fn test_restore_state_ignores_bad_blob() {
        let store = ParamStore::new();
        store.set(ParamId::Pan, 0.25);
        let before = store.snapshot_all();

        assert!(!restore_state(&store, b"garbage"));
        assert!(!restore_state(&store, &[]));
        // Valid prefix of an otherwise truncated document must not partially apply.
        assert!(!restore_state(
            &store,
            br#"{"tag":"PARAMETERS","version":1,"params":{"pan":-1.0,"volume":"#
        ));

        assert_eq!(store.snapshot_all(), before);
    }

    #[test]
    fn test_restore_state_partial_document_keeps_other_values() {
        let store = ParamStore::new();
        store.set(ParamId::Mode, 1.0);

        assert!(restore_state(
            &store,
            br#"{"tag":"PARAMETERS","version":1,"params":{"pan":0.3}}"#
        ));

        assert_eq!(store.get(ParamId::Mode), 1.0);
        assert_eq!(store.get(ParamId::Pan), 0.3);
        assert!((store.get(ParamId::Volume) - 0.7).abs() < f32::EPSILON);
    }
}
