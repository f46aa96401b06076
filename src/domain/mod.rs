mod feedback;
mod recording;
mod storage_path;

pub use feedback::{FeedbackReport, FeedbackSections, SECTION_PLACEHOLDER};
pub use recording::{Recording, RecordingId};
pub use storage_path::StoragePath;
