use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DecodeError, EncodeError};
use crate::key::CacheKey;

/// Deterministically serializes a request into its [`CacheKey`].
///
/// Two semantically equal requests must encode to the same key; the engine
/// relies on this for deduplication. Encoding is synchronous and must not
/// suspend.
pub trait KeyEncoder<R>: Send + Sync {
    fn encode(&self, request: &R) -> Result<CacheKey, EncodeError>;
}

/// The default key encoder: canonical JSON with sorted object keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonKeyEncoder;

impl<R: Serialize> KeyEncoder<R> for JsonKeyEncoder {
    fn encode(&self, request: &R) -> Result<CacheKey, EncodeError> {
        // Going through `Value` sorts object keys, so structurally equal
        // requests collide regardless of field order.
        let value = serde_json::to_value(request).map_err(EncodeError::new)?;
        let payload = serde_json::to_vec(&value).map_err(EncodeError::new)?;
        Ok(CacheKey::new(payload))
    }
}

/// Turns a raw response payload into the caller's result type.
///
/// The original request payload is passed along for context; the default
/// decoder ignores it. Decoding is synchronous; any error it raises is a
/// decode error, cacheable per the freshness policy.
pub trait ResponseDecoder: Send + Sync + 'static {
    type Item;

    fn decode(&self, request: &[u8], response: &[u8]) -> Result<Self::Item, DecodeError>;
}

/// The default decoder: parses the response payload as JSON.
pub struct JsonDecoder<T>(PhantomData<fn() -> T>);

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResponseDecoder for JsonDecoder<T>
where
    T: DeserializeOwned + 'static,
{
    type Item = T;

    fn decode(&self, _request: &[u8], response: &[u8]) -> Result<T, DecodeError> {
        serde_json::from_slice(response).map_err(DecodeError::new)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_json_encoder_sorts_map_keys() {
        let mut first = HashMap::new();
        first.insert("b", 2);
        first.insert("a", 1);
        let mut second = HashMap::new();
        second.insert("a", 1);
        second.insert("b", 2);

        let first = JsonKeyEncoder.encode(&first).unwrap();
        let second = JsonKeyEncoder.encode(&second).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.payload().as_ref(), br#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_json_encoder_empty_object() {
        let key = JsonKeyEncoder
            .encode(&serde_json::Map::<String, serde_json::Value>::new())
            .unwrap();
        assert_eq!(key.payload().as_ref(), b"{}");
    }

    #[test]
    fn test_json_decoder_ignores_request() {
        let decoder = JsonDecoder::<Vec<u32>>::new();
        let decoded = decoder.decode(b"{}", b"[1,2,3]").unwrap();
        assert_eq!(decoded, vec![1, 2, 3]);
    }

    #[test]
    fn test_json_decoder_error_is_downcastable() {
        let decoder = JsonDecoder::<Vec<u32>>::new();
        let err = decoder.decode(b"{}", b"not json").unwrap_err();
        assert!(err.downcast_ref::<serde_json::Error>().is_some());
    }
}
