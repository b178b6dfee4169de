pub mod error;
pub mod store;
pub mod testing;

pub use error::SessionStoreError;
pub use store::SessionStore;
