// SQLite-backed device storage
// Plays the role of the phone's key-value store: auth token, cached user, read markers

pub mod error;
pub mod keys;
pub mod storage;

pub use error::StoreError;
pub use storage::DeviceStorage;

pub type Result<T> = std::result::Result<T, StoreError>;
