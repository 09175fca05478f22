//! Redis adapters for cross-server fan-out, shared presence and timer
//! signals.

mod broadcaster;
mod presence_store;
mod relay;
mod timer_bus;

pub use broadcaster::RedisBroadcaster;
pub use presence_store::RedisPresenceStore;
pub use relay::RedisRelay;
pub use timer_bus::RedisTimerBus;
