//! Questionnaire sessions: bootstrap, navigation, autosave and submission.

mod autosave;
mod bootstrap;
mod config;
mod service;
mod session;

pub use autosave::SaveRequest;
pub use config::{DEFAULT_AUTOSAVE_DELAY, SessionConfig};
pub use service::AssessmentService;
pub use session::{Advance, AssessmentSession, SessionCursor};
