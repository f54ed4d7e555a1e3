pub mod draft;
pub mod manager;

pub use draft::{ScheduleDraft, ValidationMode};
pub use manager::{SaveOutcome, ScheduleManager, Session};
