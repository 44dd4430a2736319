//! Storage layer abstraction.
//!
//! Two interchangeable backends implement [`TodoStorage`]:
//! - **Redis**: durable, survives restarts
//! - **Memory**: volatile fallback when Redis is unreachable at startup

// Allow significant_drop_tightening - holding a lock or connection until the end
// of a short operation keeps each operation atomic.
#![allow(clippy::significant_drop_tightening)]

pub mod memory;
pub mod redis;
pub mod resilience;
pub mod traits;

pub use memory::InMemoryTodoStorage;
#[cfg(feature = "redis")]
pub use self::redis::RedisKeys;
pub use self::redis::RedisTodoStorage;
pub use resilience::{RetryPolicy, retry_connection};
pub use traits::TodoStorage;
