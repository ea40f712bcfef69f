use serde_json::Value;

use crate::error::{CodecError, CodecResult};

/// Encodes logical documents into atom payload bytes and back.
///
/// `decode(encode(x)) == x` must hold for every document, and encoding the
/// same document twice must produce identical bytes: the atom store treats
/// a re-insert with different bytes as an integrity violation.
pub trait DocumentCodec: Send + Sync {
    /// Short identifier used in logs and stats.
    fn name(&self) -> &'static str;

    fn encode(&self, document: &Value) -> CodecResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value>;
}

/// Plain JSON codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl DocumentCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, document: &Value) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(document).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// JSON codec with zstd compression, for large documents.
#[derive(Clone, Copy, Debug)]
pub struct ZstdJsonCodec {
    level: i32,
}

impl ZstdJsonCodec {
    pub const DEFAULT_LEVEL: i32 = 3;

    pub fn new(level: i32) -> Self {
        Self { level }
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdJsonCodec {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEVEL)
    }
}

impl DocumentCodec for ZstdJsonCodec {
    fn name(&self) -> &'static str {
        "zstd-json"
    }

    fn encode(&self, document: &Value) -> CodecResult<Vec<u8>> {
        let json = JsonCodec.encode(document)?;
        Ok(zstd::encode_all(json.as_slice(), self.level)?)
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        let json = zstd::decode_all(bytes)?;
        JsonCodec.decode(&json)
    }
}
