//! JSON rendering of decoded frames
//!
//! Byte strings are usually large (CAR slices, signatures) and useless on a
//! terminal, so the default rendering elides them as `"[...]"`. Content
//! identifiers follow the DAG-JSON convention `{"$link": "<cid>"}`.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::cbor::{DecodedValue, Mapping};
use crate::frame::Frame;

/// Placeholder written instead of byte-string contents in elided mode
pub const ELIDED_BYTES: &str = "[...]";

/// How byte strings appear in rendered output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BytesRendering {
    /// Replace contents with `"[...]"`
    #[default]
    Elide,
    /// Lowercase hex string
    Hex,
    /// `{"$bytes": "<base64>"}`
    Base64,
}

/// Render one decoded value as JSON
pub fn to_json(value: &DecodedValue, bytes: BytesRendering) -> Value {
    match value {
        DecodedValue::Integer(n) => json!(n),
        DecodedValue::Bytes(raw) => render_bytes(raw, bytes),
        DecodedValue::Text(text) => Value::String(text.clone()),
        DecodedValue::Array(items) => {
            Value::Array(items.iter().map(|item| to_json(item, bytes)).collect())
        }
        DecodedValue::Map(map) => mapping_to_json(map, bytes),
        DecodedValue::Bool(flag) => Value::Bool(*flag),
        DecodedValue::Null => Value::Null,
        DecodedValue::ContentId(cid) => json!({ "$link": cid.to_multibase() }),
    }
}

/// Render a map as a JSON object
pub fn mapping_to_json(map: &Mapping, bytes: BytesRendering) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), to_json(value, bytes)))
            .collect::<Map<String, Value>>(),
    )
}

/// Render a frame as `{"header": ..., "payload": ...}`
pub fn frame_to_json(frame: &Frame, bytes: BytesRendering) -> Value {
    json!({
        "header": mapping_to_json(frame.header(), bytes),
        "payload": mapping_to_json(frame.payload(), bytes),
    })
}

fn render_bytes(raw: &[u8], mode: BytesRendering) -> Value {
    match mode {
        BytesRendering::Elide => Value::String(ELIDED_BYTES.to_string()),
        BytesRendering::Hex => Value::String(hex::encode(raw)),
        BytesRendering::Base64 => json!({ "$bytes": STANDARD_NO_PAD.encode(raw) }),
    }
}
