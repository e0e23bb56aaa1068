use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Raised when a payload cannot be turned into a record. Carries a copy of the
/// raw payload so the failure can be logged with its input.
#[derive(Error, Debug)]
#[error("failed to decode payload: {reason}")]
pub struct DecodeError {
    pub payload: Bytes,
    pub reason: String,
}

impl DecodeError {
    pub fn new(payload: &[u8], reason: impl ToString) -> Self {
        Self {
            payload: Bytes::copy_from_slice(payload),
            reason: reason.to_string(),
        }
    }

    /// Lossy UTF-8 rendering of the payload, cut at `max_len` bytes.
    pub fn payload_preview(&self, max_len: usize) -> String {
        let end = self.payload.len().min(max_len);
        let mut preview = String::from_utf8_lossy(&self.payload[..end]).into_owned();
        if end < self.payload.len() {
            preview.push_str("...");
        }
        preview
    }
}

/// Turns the raw bytes of a message into a typed record. Decoders must not
/// panic on malformed input.
pub trait Decoder: Send {
    type Record: Send;

    fn decode(&self, payload: &[u8]) -> Result<Self::Record, DecodeError>;
}

/// Decodes JSON payloads into any deserializable record type.
pub struct JsonDecoder<T> {
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Decoder for JsonDecoder<T>
where
    T: DeserializeOwned + Send,
{
    type Record = T;

    fn decode(&self, payload: &[u8]) -> Result<T, DecodeError> {
        if payload.is_empty() {
            return Err(DecodeError::new(payload, "empty payload"));
        }
        serde_json::from_slice(payload).map_err(|e| DecodeError::new(payload, e))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
        name: String,
    }

    #[test]
    fn decodes_json() {
        let decoder = JsonDecoder::<Row>::new();
        let row = decoder.decode(br#"{"id": 4, "name": "Saka"}"#).unwrap();
        assert_eq!(
            row,
            Row {
                id: 4,
                name: "Saka".to_string()
            }
        );
    }

    #[test]
    fn malformed_payload_keeps_raw_bytes() {
        let decoder = JsonDecoder::<Row>::new();
        let err = decoder.decode(b"{not json").unwrap_err();
        assert_eq!(err.payload, Bytes::from_static(b"{not json"));
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn empty_payload_is_an_error() {
        let decoder = JsonDecoder::<Row>::new();
        let err = decoder.decode(b"").unwrap_err();
        assert_eq!(err.reason, "empty payload");
    }

    #[test]
    fn preview_is_truncated() {
        let err = DecodeError::new(b"abcdefgh", "bad");
        assert_eq!(err.payload_preview(3), "abc...");
        assert_eq!(err.payload_preview(100), "abcdefgh");
    }
}
