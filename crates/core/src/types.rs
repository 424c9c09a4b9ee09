/// Frame identifiers are allocated by the ingest side and never reused.
pub type FrameId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
