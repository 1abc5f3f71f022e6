//! Fixed storage keys. These match the keys the mobile client used, so a
//! migrated data file keeps working.

pub const AUTH_TOKEN: &str = "dalepata-auth-token";
pub const USER_DATA: &str = "dalepata-user";
pub const READ_NOTIFICATIONS: &str = "dalepata-read-notifications";

/// Everything that belongs to a signed-in user
pub const SESSION_KEYS: [&str; 3] = [AUTH_TOKEN, USER_DATA, READ_NOTIFICATIONS];
