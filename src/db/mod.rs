pub mod redis;
pub mod session;

pub use self::redis::create_redis_client;
pub use self::redis::RedisSessionStore;
pub use self::session::{MemorySessionStore, SessionStore};
