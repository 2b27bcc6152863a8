//! [`ShipmentStore`](crate::domain::repositories::ShipmentStore) backends.
//!
//! Every backend stores the complete collection as one JSON value.
//!
//! - [`FileShipmentStore`] - JSON file with atomic replace
//! - [`RedisShipmentStore`] - single Redis key
//! - [`MemoryShipmentStore`] - process memory, for tests and throwaway runs

pub mod file_store;
pub mod memory_store;
pub mod redis_store;

pub use file_store::FileShipmentStore;
pub use memory_store::MemoryShipmentStore;
pub use redis_store::RedisShipmentStore;
