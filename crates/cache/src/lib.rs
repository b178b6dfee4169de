pub mod cache;
pub mod data;
pub mod error;
pub mod memory;

pub use cache::{PayloadCache, PayloadUpdate};
pub use data::{CachedSignatureData, REPLACE_ATTACHMENT_KEY};
pub use error::CacheError;
pub use memory::MemoryPayloadCache;
