/// Telegram user ids are 64-bit integers and double as database primary keys.
pub type UserId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
