// Client-side core: virtual notifications derived from adoption requests
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod notifications;
pub mod providers;
pub mod read_state;
pub mod session;
pub mod source;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::Error;
pub use models::{AdoptionRequest, PetRef, RequestStatus};
pub use notifications::{NotificationEntry, NotificationKind, Notifier};
pub use read_state::{DeviceReadStateStore, MemoryReadStateStore, ReadIds, ReadStateStore};
pub use session::Session;
pub use source::AdoptionRequestSource;

pub type Result<T> = std::result::Result<T, Error>;
