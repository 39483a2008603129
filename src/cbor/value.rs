//! Decoded value tree

use std::collections::BTreeMap;
use std::fmt;

/// String-keyed map produced by decoding a CBOR map
///
/// Keys are unique; when a key repeats on the wire the later value wins.
pub type Mapping = BTreeMap<String, DecodedValue>;

/// Leading byte of the raw identity multibase prefix carried by tag 42
const MULTIBASE_IDENTITY_PREFIX: u8 = 0x00;

/// Content identifier carried under tag 42
///
/// The bytes are kept exactly as they appeared on the wire (including the
/// leading multibase identity byte); the hash structure is never parsed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentId(Vec<u8>);

impl ContentId {
    /// Wrap raw tag-42 bytes
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes as they appeared on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Render as a base32 multibase string (`b` prefix, lowercase, unpadded)
    pub fn to_multibase(&self) -> String {
        let raw = self
            .0
            .strip_prefix(&[MULTIBASE_IDENTITY_PREFIX])
            .unwrap_or(&self.0);
        let encoded = base32::encode(base32::Alphabet::Rfc4648 { padding: false }, raw);
        format!("b{}", encoded.to_lowercase())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_multibase())
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.to_multibase())
    }
}

/// One decoded item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    /// Major types 0 and 1
    Integer(i64),
    /// Major type 2
    Bytes(Vec<u8>),
    /// Major type 3
    Text(String),
    /// Major type 4
    Array(Vec<DecodedValue>),
    /// Major type 5
    Map(Mapping),
    /// Simple values 20 and 21
    Bool(bool),
    /// Simple value 22
    Null,
    /// Tag 42 over a byte string
    ContentId(ContentId),
}

impl DecodedValue {
    /// Short type name for diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Bool(_) => "bool",
            Self::Null => "null",
            Self::ContentId(_) => "cid",
        }
    }

    /// Integer value, if this is an integer
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Text value, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Byte string, if this is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Boolean value, if this is a boolean
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Elements, if this is an array
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Entries, if this is a map
    pub const fn as_map(&self) -> Option<&Mapping> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Content identifier, if this is a tag-42 link
    pub const fn as_content_id(&self) -> Option<&ContentId> {
        match self {
            Self::ContentId(cid) => Some(cid),
            _ => None,
        }
    }

    /// Whether this is null
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Look up a key when this is a map
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Take the map out, or hand the value back unchanged
    pub fn into_map(self) -> Result<Mapping, Self> {
        match self {
            Self::Map(map) => Ok(map),
            other => Err(other),
        }
    }
}

impl From<i64> for DecodedValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for DecodedValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for DecodedValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for DecodedValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<Self>> for DecodedValue {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

impl From<Mapping> for DecodedValue {
    fn from(map: Mapping) -> Self {
        Self::Map(map)
    }
}

impl From<ContentId> for DecodedValue {
    fn from(cid: ContentId) -> Self {
        Self::ContentId(cid)
    }
}
