pub mod app_config;
pub mod error;
pub mod kv;
pub mod redis_repo;
pub mod snapshot_repo;

pub use app_config::{Config, RulesConfig, StorageBackend, StorageConfig};
pub use error::{StoreError, StoreResult};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use redis_repo::RedisStore;
pub use snapshot_repo::{SnapshotRepository, BOOKINGS_KEY, DEMO_MODE_KEY, SEATS_KEY};
