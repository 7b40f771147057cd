pub mod memory;
pub mod postgres;
pub mod redis;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PgStore};
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use store::{ActivityStore, Store, TipStore, UserStore};
