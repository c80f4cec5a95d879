pub mod clock;
pub mod config;
pub mod lock;
pub mod middleware;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use store::{CachedPage, PageKey, PageStore};
