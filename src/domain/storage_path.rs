use std::fmt;

use super::recording::RecordingId;

/// Spool location of a staged recording, unique per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn for_recording(id: &RecordingId, filename: &str) -> Self {
        // Client-supplied name: keep only the final path component.
        let basename = filename
            .rsplit(['/', '\\'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("recording");
        Self(format!("{}/{}", id.as_uuid(), basename))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
