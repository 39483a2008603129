//! Frame assembler
//!
//! A firehose message is two consecutive DAG-CBOR maps: a header carrying
//! the operation (`op`) and message type (`t`), then the payload. Decoding
//! is a pure function of the buffer; a failure anywhere aborts the frame.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cbor::{DecodeOptions, DecodedValue, Decoder, MajorType, Mapping, DEFAULT_MAX_DEPTH};
use crate::error::{DecodeError, DecodeResult, FramePart};

/// Header `op` value for a regular message frame
pub const OP_MESSAGE: i64 = 1;

/// Header `op` value for an error frame
pub const OP_ERROR: i64 = -1;

/// What to do with bytes left after the payload map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingBytes {
    /// Accept the frame and ignore the remainder
    #[default]
    Ignore,
    /// Fail with [`DecodeError::TrailingBytes`]
    Reject,
}

/// Tunables for decoding one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    /// Maximum nesting depth inside the header and payload
    pub max_depth: usize,
    /// Trailing-byte policy
    pub trailing_bytes: TrailingBytes,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trailing_bytes: TrailingBytes::Ignore,
        }
    }
}

impl FrameOptions {
    const fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            max_depth: self.max_depth,
        }
    }
}

/// One decoded event: header map followed by payload map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: Mapping,
    payload: Mapping,
    encoded_len: usize,
}

impl Frame {
    /// Header map
    pub const fn header(&self) -> &Mapping {
        &self.header
    }

    /// Payload map
    pub const fn payload(&self) -> &Mapping {
        &self.payload
    }

    /// Bytes consumed by the header and payload
    pub const fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// Header `op`, if present and an integer
    pub fn op(&self) -> Option<i64> {
        self.header.get("op").and_then(DecodedValue::as_integer)
    }

    /// Header `t` (message type such as `#commit`), if present and text
    pub fn kind(&self) -> Option<&str> {
        self.header.get("t").and_then(DecodedValue::as_text)
    }

    /// Whether the header marks this as an error frame
    pub fn is_error(&self) -> bool {
        self.op() == Some(OP_ERROR)
    }

    /// Split into header and payload
    pub fn into_parts(self) -> (Mapping, Mapping) {
        (self.header, self.payload)
    }
}

/// Decode one frame with default options (trailing bytes ignored).
pub fn decode_frame(buf: &[u8]) -> DecodeResult<Frame> {
    decode_frame_with(buf, &FrameOptions::default())
}

/// Decode one frame from a complete message buffer.
pub fn decode_frame_with(buf: &[u8], options: &FrameOptions) -> DecodeResult<Frame> {
    let mut decoder = Decoder::new(buf, 0, &options.decode_options());

    let header = expect_map(&mut decoder, FramePart::Header)?;
    trace!(header_len = decoder.position(), "decoded frame header");
    let payload = expect_map(&mut decoder, FramePart::Payload)?;
    let encoded_len = decoder.position();

    let remaining = decoder.remaining();
    trace!(encoded_len, remaining, "decoded frame payload");
    if remaining > 0 && options.trailing_bytes == TrailingBytes::Reject {
        return Err(DecodeError::TrailingBytes { remaining });
    }

    Ok(Frame {
        header,
        payload,
        encoded_len,
    })
}

fn expect_map(decoder: &mut Decoder<'_>, part: FramePart) -> DecodeResult<Mapping> {
    let found = decoder.peek_major()?;
    if found != MajorType::Map {
        return Err(DecodeError::InvalidFrameStructure { part, found });
    }

    match decoder.decode_next()? {
        DecodedValue::Map(map) => Ok(map),
        _ => Err(DecodeError::InvalidFrameStructure { part, found }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // {"op": 1, "t": "#commit"}
    const COMMIT_HEADER: [u8; 15] = [
        0xA2, 0x62, b'o', b'p', 0x01, 0x61, b't', 0x67, b'#', b'c', b'o', b'm', b'm', b'i', b't',
    ];

    // {"seq": 300, "cid": 42(h'000171')}
    const PAYLOAD: [u8; 18] = [
        0xA2, 0x63, b's', b'e', b'q', 0x19, 0x01, 0x2C, 0x63, b'c', b'i', b'd', 0xD8, 0x2A, 0x43,
        0x00, 0x01, 0x71,
    ];

    fn frame_bytes() -> Vec<u8> {
        [COMMIT_HEADER.as_slice(), PAYLOAD.as_slice()].concat()
    }

    #[test]
    fn test_decode_frame() {
        let frame = decode_frame(&frame_bytes()).unwrap();

        assert_eq!(frame.op(), Some(OP_MESSAGE));
        assert_eq!(frame.kind(), Some("#commit"));
        assert!(!frame.is_error());
        assert_eq!(frame.header().len(), 2);
        assert_eq!(frame.payload().get("seq"), Some(&DecodedValue::Integer(300)));
        assert!(frame
            .payload()
            .get("cid")
            .and_then(DecodedValue::as_content_id)
            .is_some());
        assert_eq!(frame.encoded_len(), COMMIT_HEADER.len() + PAYLOAD.len());
    }

    #[test]
    fn test_header_and_payload_match_standalone_decode() {
        let frame = decode_frame(&frame_bytes()).unwrap();
        let (header, _) = crate::cbor::decode_value(&COMMIT_HEADER, 0).unwrap();
        let (payload, _) = crate::cbor::decode_value(&PAYLOAD, 0).unwrap();

        let (frame_header, frame_payload) = frame.into_parts();
        assert_eq!(DecodedValue::Map(frame_header), header);
        assert_eq!(DecodedValue::Map(frame_payload), payload);
    }

    #[test]
    fn test_error_frame() {
        // {"op": -1} {"error": "FutureCursor"}
        let mut bytes = vec![0xA1, 0x62, b'o', b'p', 0x20, 0xA1, 0x65];
        bytes.extend_from_slice(b"error");
        bytes.push(0x6C);
        bytes.extend_from_slice(b"FutureCursor");

        let frame = decode_frame(&bytes).unwrap();
        assert!(frame.is_error());
        assert_eq!(frame.kind(), None);
    }

    #[test]
    fn test_header_must_be_map() {
        let mut bytes = vec![0x81, 0x01];
        bytes.extend_from_slice(&PAYLOAD);
        let err = decode_frame(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidFrameStructure {
                part: FramePart::Header,
                found: MajorType::Array,
            }
        );
    }

    #[test]
    fn test_payload_must_be_map() {
        let mut bytes = COMMIT_HEADER.to_vec();
        bytes.extend_from_slice(&[0x63, b'a', b'b', b'c']);
        let err = decode_frame(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidFrameStructure {
                part: FramePart::Payload,
                found: MajorType::Text,
            }
        );
    }

    #[test]
    fn test_header_type_checked_before_argument() {
        // Negative integer with reserved code 28
        let err = decode_frame(&[0x3C]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidFrameStructure {
                part: FramePart::Header,
                found: MajorType::Negative,
            }
        );

        // Two-byte unsigned cut short
        let err = decode_frame(&[0x19, 0x01]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidFrameStructure {
                part: FramePart::Header,
                found: MajorType::Unsigned,
            }
        );

        let mut bytes = COMMIT_HEADER.to_vec();
        bytes.push(0x9F);
        let err = decode_frame(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidFrameStructure {
                part: FramePart::Payload,
                found: MajorType::Array,
            }
        );
    }

    #[test]
    fn test_missing_payload_is_underrun() {
        let err = decode_frame(&COMMIT_HEADER).unwrap_err();
        assert!(matches!(err, DecodeError::BufferUnderrun { offset: 15, .. }));
    }

    #[test]
    fn test_empty_buffer_is_underrun() {
        let err = decode_frame(&[]).unwrap_err();
        assert!(matches!(err, DecodeError::BufferUnderrun { offset: 0, .. }));
    }

    #[test]
    fn test_error_inside_payload_aborts_frame() {
        let mut bytes = COMMIT_HEADER.to_vec();
        // {"x": simple(23)}
        bytes.extend_from_slice(&[0xA1, 0x61, b'x', 0xF7]);
        let err = decode_frame(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::InvalidSimpleValue { value: 23, offset: 18 });
    }

    #[test]
    fn test_trailing_bytes_policy() {
        let mut bytes = frame_bytes();
        bytes.extend_from_slice(&[0x00, 0x00, 0x00]);

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.encoded_len(), bytes.len() - 3);

        let strict = FrameOptions {
            trailing_bytes: TrailingBytes::Reject,
            ..FrameOptions::default()
        };
        let err = decode_frame_with(&bytes, &strict).unwrap_err();
        assert_eq!(err, DecodeError::TrailingBytes { remaining: 3 });

        assert!(decode_frame_with(&frame_bytes(), &strict).is_ok());
    }

    #[test]
    fn test_depth_limit_applies_to_payload() {
        let mut bytes = COMMIT_HEADER.to_vec();
        // {"a": [[1]]}
        bytes.extend_from_slice(&[0xA1, 0x61, b'a', 0x81, 0x81, 0x01]);

        let shallow = FrameOptions {
            max_depth: 2,
            ..FrameOptions::default()
        };
        let err = decode_frame_with(&bytes, &shallow).unwrap_err();
        assert!(matches!(err, DecodeError::DepthLimitExceeded { limit: 2, .. }));

        assert!(decode_frame(&bytes).is_ok());
    }

    #[test]
    fn test_deterministic() {
        let bytes = frame_bytes();
        assert_eq!(decode_frame(&bytes).unwrap(), decode_frame(&bytes).unwrap());
    }

    #[test]
    fn test_frame_roundtrip_with_reference_encoder() {
        let mut bytes = Vec::new();
        let header = ciborium::Value::Map(vec![
            (ciborium::Value::from("op"), ciborium::Value::from(1)),
            (ciborium::Value::from("t"), ciborium::Value::from("#identity")),
        ]);
        let payload = ciborium::Value::Map(vec![
            (ciborium::Value::from("did"), ciborium::Value::from("did:plc:abc")),
            (ciborium::Value::from("seq"), ciborium::Value::from(7)),
        ]);
        ciborium::into_writer(&header, &mut bytes).unwrap();
        ciborium::into_writer(&payload, &mut bytes).unwrap();

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.kind(), Some("#identity"));
        assert_eq!(
            frame.payload().get("did").and_then(DecodedValue::as_text),
            Some("did:plc:abc")
        );
        assert_eq!(frame.payload().get("seq"), Some(&DecodedValue::Integer(7)));
    }
}
