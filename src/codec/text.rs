//! Text pose frame format.
//!
//! A text frame is a UTF-8 JSON object in which any subset of the
//! recognized keys may appear:
//!
//! ```json
//! {"location": [0.0, 1.5, -0.25], "rotation": [0.0, 90.0, 0.0],
//!  "fingers": {"thumb": 0.1, "ring": 0.8}}
//! ```
//!
//! This is the only format that carries partial updates: a missing key
//! means "field not present", and the decoded event only touches the sink
//! operations for the keys that were there. Unrecognized keys (and unknown
//! finger names) are ignored so that newer producers can talk to older
//! consumers.

use serde_json::Value;

use crate::core::{DecodeError, Finger, PoseDelta, PoseEvent, Vec3};

/// Recognized top-level key for the hand location.
pub const KEY_LOCATION: &str = "location";

/// Recognized top-level key for the hand rotation.
pub const KEY_ROTATION: &str = "rotation";

/// Recognized top-level key for the finger flexion map.
pub const KEY_FINGERS: &str = "fingers";

/// Decode one text pose frame.
///
/// Missing keys are tolerated; a recognized key holding a value of the
/// wrong type or arity yields [`DecodeError::InvalidField`] with the key
/// path. Payloads that are not a UTF-8 JSON object yield
/// [`DecodeError::MalformedText`].
pub fn decode_text(data: &[u8]) -> Result<PoseEvent, DecodeError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| DecodeError::MalformedText(e.to_string()))?;
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| DecodeError::MalformedText(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::MalformedText("top-level value is not an object".into()))?;

    let mut delta = PoseDelta::default();

    if let Some(v) = object.get(KEY_LOCATION) {
        delta.location = Some(parse_vec3(v, KEY_LOCATION)?);
    }
    if let Some(v) = object.get(KEY_ROTATION) {
        delta.rotation = Some(parse_vec3(v, KEY_ROTATION)?);
    }
    if let Some(v) = object.get(KEY_FINGERS) {
        let map = v
            .as_object()
            .ok_or_else(|| DecodeError::InvalidField(KEY_FINGERS.into()))?;
        for (name, factor) in map {
            // Unknown finger names are ignored, same as unrecognized keys.
            let Some(finger) = Finger::from_wire_name(name) else {
                continue;
            };
            let factor = factor
                .as_f64()
                .ok_or_else(|| DecodeError::InvalidField(format!("{KEY_FINGERS}.{name}")))?;
            delta.flexion[finger.index()] = Some(factor as f32);
        }
    }

    Ok(PoseEvent::Delta(delta))
}

/// Encode a partial update as one text frame (no trailing delimiter).
pub fn encode_text(delta: &PoseDelta) -> String {
    let mut object = serde_json::Map::new();
    if let Some(location) = delta.location {
        object.insert(KEY_LOCATION.into(), vec3_value(location));
    }
    if let Some(rotation) = delta.rotation {
        object.insert(KEY_ROTATION.into(), vec3_value(rotation));
    }
    let fingers: serde_json::Map<String, Value> = Finger::ALL
        .iter()
        .filter_map(|&finger| {
            delta.flexion[finger.index()]
                .map(|factor| (finger.wire_name().into(), Value::from(factor as f64)))
        })
        .collect();
    if !fingers.is_empty() {
        object.insert(KEY_FINGERS.into(), Value::Object(fingers));
    }
    Value::Object(object).to_string()
}

fn parse_vec3(value: &Value, key: &str) -> Result<Vec3, DecodeError> {
    let items = value
        .as_array()
        .filter(|a| a.len() == 3)
        .ok_or_else(|| DecodeError::InvalidField(key.into()))?;
    let mut components = [0.0f32; 3];
    for (slot, item) in components.iter_mut().zip(items) {
        *slot = item
            .as_f64()
            .ok_or_else(|| DecodeError::InvalidField(key.into()))? as f32;
    }
    Ok(Vec3::from_array(components))
}

fn vec3_value(v: Vec3) -> Value {
    Value::from(vec![v.x as f64, v.y as f64, v.z as f64])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_only_frame() {
        let event = decode_text(br#"{"rotation": [0.0, 90.0, -45.0]}"#).unwrap();
        match event {
            PoseEvent::Delta(delta) => {
                assert_eq!(delta.rotation, Some(Vec3::new(0.0, 90.0, -45.0)));
                assert!(delta.location.is_none());
                assert!(delta.flexion.iter().all(Option::is_none));
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_fingers_frame() {
        let event = decode_text(br#"{"fingers": {"thumb": 0.25, "pinky": 1.0}}"#).unwrap();
        match event {
            PoseEvent::Delta(delta) => {
                assert_eq!(delta.flexion[Finger::Thumb.index()], Some(0.25));
                assert_eq!(delta.flexion[Finger::Pinky.index()], Some(1.0));
                assert_eq!(delta.flexion[Finger::Index.index()], None);
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_unrecognized_keys_are_ignored() {
        let event =
            decode_text(br#"{"location": [1, 2, 3], "timestamp": 99, "fingers": {"palm": 1.0}}"#)
                .unwrap();
        match event {
            PoseEvent::Delta(delta) => {
                assert_eq!(delta.location, Some(Vec3::new(1.0, 2.0, 3.0)));
                assert!(delta.flexion.iter().all(Option::is_none));
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_type_mismatch_names_the_field() {
        let result = decode_text(br#"{"rotation": "ninety"}"#);
        assert_eq!(result, Err(DecodeError::InvalidField("rotation".into())));

        let result = decode_text(br#"{"location": [1, 2]}"#);
        assert_eq!(result, Err(DecodeError::InvalidField("location".into())));

        let result = decode_text(br#"{"fingers": {"ring": "half"}}"#);
        assert_eq!(
            result,
            Err(DecodeError::InvalidField("fingers.ring".into()))
        );
    }

    #[test]
    fn test_non_object_payloads_are_malformed() {
        assert!(matches!(
            decode_text(b"[1, 2, 3]"),
            Err(DecodeError::MalformedText(_))
        ));
        assert!(matches!(
            decode_text(b"not json at all"),
            Err(DecodeError::MalformedText(_))
        ));
        assert!(matches!(
            decode_text(&[0xFF, 0xFE, 0x80]),
            Err(DecodeError::MalformedText(_))
        ));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let delta = PoseDelta {
            location: Some(Vec3::new(0.5, -1.5, 2.0)),
            rotation: None,
            flexion: [None, Some(0.5), None, None, Some(1.0)],
        };
        let text = encode_text(&delta);
        let event = decode_text(text.as_bytes()).unwrap();
        assert_eq!(event, PoseEvent::Delta(delta));
    }

    #[test]
    fn test_encode_empty_delta() {
        assert_eq!(encode_text(&PoseDelta::default()), "{}");
    }
}
