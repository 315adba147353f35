//! Data model for extraction results and résumé records.

mod extraction;
mod report;
mod resume;

pub use extraction::{is_sufficient, ExtractionResult, OcrAttempt, RawPage, MIN_TEXT_LENGTH};
pub use report::{Diagnostics, IngestReport, SourceFile};
pub use resume::{Contact, EducationEntry, ExperienceEntry, ProjectEntry, ResumeRecord};
