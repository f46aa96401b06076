use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordingId(Uuid);

impl RecordingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One uploaded interview recording. Lives for exactly one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub id: RecordingId,
    pub filename: String,
    pub media_type: String,
    pub size_bytes: u64,
}

impl Recording {
    pub fn new(filename: String, media_type: String, size_bytes: u64) -> Self {
        Self {
            id: RecordingId::new(),
            filename,
            media_type,
            size_bytes,
        }
    }

    /// The upload boundary only admits audio payloads.
    pub fn accepts_media_type(media_type: &str) -> bool {
        media_type.starts_with("audio/")
    }
}
