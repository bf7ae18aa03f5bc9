//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_key_value_storage;
mod json_file_key_value_storage;
mod redis_key_value_storage;

pub use in_memory_key_value_storage::InMemoryKeyValueStorage;
pub use json_file_key_value_storage::JsonFileKeyValueStorage;
pub use redis_key_value_storage::RedisKeyValueStorage;
