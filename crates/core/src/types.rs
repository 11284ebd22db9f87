/// Dispatch identifiers are opaque server-assigned strings.
pub type DispatchId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
