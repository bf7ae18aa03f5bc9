//! Best-effort JSON persistence over [`KeyValueStorage`].
//!
//! Client-side state must never fail a user action because storage is full,
//! unavailable or holds a malformed document. These helpers log the failure
//! and report it as "nothing stored" / "not written".

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::storage_ports::KeyValueStorage;

/// Reads and decodes the JSON document under `key`.
///
/// Returns `None` when the key is missing or the read or decode fails.
pub(crate) async fn read_json<T>(storage: &dyn KeyValueStorage, key: &str) -> Option<T>
where
    T: DeserializeOwned,
{
    let raw = match storage.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(error) => {
            warn!(key, error = %error, "failed to read persisted state");
            return None;
        }
    };

    decode_json(key, raw.as_str())
}

/// Decodes a raw JSON document read from `key`, logging malformed input.
pub(crate) fn decode_json<T>(key: &str, raw: &str) -> Option<T>
where
    T: DeserializeOwned,
{
    match serde_json::from_str::<T>(raw) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(key, error = %error, "ignoring malformed persisted state");
            None
        }
    }
}

/// Encodes and writes `value` under `key`. Returns whether the write landed.
pub(crate) async fn write_json<T>(storage: &dyn KeyValueStorage, key: &str, value: &T) -> bool
where
    T: Serialize + ?Sized,
{
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(error) => {
            warn!(key, error = %error, "failed to encode state for persistence");
            return false;
        }
    };

    match storage.set(key, encoded.as_str()).await {
        Ok(()) => true,
        Err(error) => {
            warn!(key, error = %error, "failed to persist state");
            false
        }
    }
}

/// Removes `key`. Returns whether the removal landed.
pub(crate) async fn remove_key(storage: &dyn KeyValueStorage, key: &str) -> bool {
    match storage.remove(key).await {
        Ok(()) => true,
        Err(error) => {
            warn!(key, error = %error, "failed to remove persisted state");
            false
        }
    }
}
