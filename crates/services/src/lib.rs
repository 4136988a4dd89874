#![forbid(unsafe_code)]

pub mod assessment;
pub mod error;

pub use error::{BootstrapError, SessionError};

pub use assessment::{
    Advance, AssessmentService, AssessmentSession, DEFAULT_AUTOSAVE_DELAY, SaveRequest,
    SessionConfig, SessionCursor,
};
