use assessment_core::model::{CategoryStatus, StatusRecord};
use sqlx::Row;

use crate::repository::{CategorySubmission, ProgressResponses, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_status_row(row: &sqlx::sqlite::SqliteRow) -> Result<StatusRecord, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    let current_progress = u32_from_i64(
        "current_progress",
        row.try_get::<i64, _>("current_progress").map_err(ser)?,
    )?;
    Ok(StatusRecord {
        status: status.parse::<CategoryStatus>().map_err(ser)?,
        current_progress,
        last_updated: row.try_get("last_updated").map_err(ser)?,
    })
}

pub(crate) fn responses_to_json(responses: &ProgressResponses) -> Result<String, StorageError> {
    serde_json::to_string(responses).map_err(ser)
}

pub(crate) fn responses_from_json(raw: &str) -> Result<ProgressResponses, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn submission_to_json(submission: &CategorySubmission) -> Result<String, StorageError> {
    serde_json::to_string(submission).map_err(ser)
}

pub(crate) fn submission_from_json(raw: &str) -> Result<CategorySubmission, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SubmittedAnswer;
    use assessment_core::model::{AnswerValue, QuestionId};

    #[test]
    fn responses_json_is_keyed_by_index_string() {
        let mut responses = ProgressResponses::new();
        responses.insert(0, AnswerValue::from("2"));
        let raw = responses_to_json(&responses).unwrap();
        assert_eq!(raw, r#"{"0":"2"}"#);
        assert_eq!(responses_from_json(&raw).unwrap(), responses);
    }

    #[test]
    fn submission_json_matches_wire_shape() {
        let mut submission = CategorySubmission::new();
        submission.insert(
            QuestionId::from("q1"),
            SubmittedAnswer {
                question: "I enjoy puzzles".into(),
                score: 3,
            },
        );
        let raw = submission_to_json(&submission).unwrap();
        assert_eq!(raw, r#"{"q1":{"question":"I enjoy puzzles","score":3}}"#);
        assert_eq!(submission_from_json(&raw).unwrap(), submission);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = responses_from_json("{\"x\":1}").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
