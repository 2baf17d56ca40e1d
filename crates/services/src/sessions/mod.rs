mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use quiz_core::model::SessionProgress;
pub use view::{ActiveTest, SubmissionFeedback};
pub use workflow::SessionLoopService;
