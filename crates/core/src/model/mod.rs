mod answer;
mod category;
mod ids;
mod question;
mod status;

pub use answer::{AnswerKey, AnswerStore, AnswerValue};
pub use category::{Category, CategoryCatalog, CategoryError, ScaleOption};
pub use ids::{CategoryKey, QuestionId, UserId};
pub use question::{Question, QuestionBank};
pub use status::{CategoryStatus, CategoryStatusMap, StatusParseError, StatusRecord};
