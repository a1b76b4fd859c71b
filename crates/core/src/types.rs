/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier of a connected peer (WebSocket connection id).
pub type PeerId = String;
