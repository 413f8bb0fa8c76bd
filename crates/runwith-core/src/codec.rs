//! Encoding of bound calls and return values.
//!
//! A codec must round-trip every value it accepts byte-exactly: what the caller
//! encodes into the dump is what the worker decodes, and vice versa for the result.
use serde_json::Value;

use runwith_model::BoundCall;

use crate::error::CoreError;

/// Pluggable serialization capability for job artifacts.
pub trait Codec: Send + Sync {
    /// Codec name used in logs and errors.
    fn name(&self) -> &'static str;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CoreError>;

    fn decode(&self, bytes: &[u8]) -> Result<Value, CoreError>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(value).map_err(|e| CoreError::Codec {
            codec: self.name(),
            reason: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CoreError> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::Codec {
            codec: self.name(),
            reason: e.to_string(),
        })
    }
}

/// Encode a bound call for the dump file.
pub fn encode_call(codec: &dyn Codec, call: &BoundCall) -> Result<Vec<u8>, CoreError> {
    let value = serde_json::to_value(call).map_err(|e| CoreError::Codec {
        codec: codec.name(),
        reason: e.to_string(),
    })?;
    codec.encode(&value)
}

/// Decode a bound call from dump bytes.
pub fn decode_call(codec: &dyn Codec, bytes: &[u8]) -> Result<BoundCall, CoreError> {
    let value = codec.decode(bytes)?;
    serde_json::from_value(value).map_err(|e| CoreError::Codec {
        codec: codec.name(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn call_survives_encoding() {
        let call = BoundCall::new("f").arg(json!([1, 2, 3])).kwarg("name", "x");
        let bytes = encode_call(&JsonCodec, &call).unwrap();
        assert_eq!(decode_call(&JsonCodec, &bytes).unwrap(), call);
    }

    #[test]
    fn garbage_is_a_codec_error() {
        assert!(matches!(
            JsonCodec.decode(b"\x00\x01"),
            Err(CoreError::Codec { codec: "json", .. })
        ));
        assert!(decode_call(&JsonCodec, b"[1, 2]").is_err());
    }
}
