//! Status reply returned by every mutating desk operation

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult, ErrorCode};

/// One-line status message suitable for direct display, plus a success flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Outcome {
    pub success: bool,
    #[schema(value_type = u32)]
    #[serde(with = "code_as_number")]
    pub code: ErrorCode,
    pub message: String,
    /// Id of the book or loan created by the operation, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: ErrorCode::Success,
            message: message.into(),
            id: None,
        }
    }

    pub fn created(id: i64, message: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            ..Self::ok(message)
        }
    }

    pub fn failed(err: &AppError) -> Self {
        Self {
            success: false,
            code: err.code(),
            message: err.to_string(),
            id: None,
        }
    }

    /// Fold business errors into a failed outcome. Anything else (store
    /// unavailable, migration failure) stays a hard error for the caller.
    pub fn from_result(result: AppResult<Outcome>) -> AppResult<Outcome> {
        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) if err.is_business() => {
                tracing::warn!("Rejected: {}", err);
                Ok(Outcome::failed(&err))
            }
            Err(err) => Err(err),
        }
    }
}

mod code_as_number {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::error::ErrorCode;

    pub fn serialize<S: Serializer>(code: &ErrorCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(*code as u32)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ErrorCode, D::Error> {
        let code = u32::deserialize(deserializer)?;
        Ok(match code {
            0 => ErrorCode::Success,
            2 => ErrorCode::DbFailure,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::Duplicate,
            5 => ErrorCode::NoCopiesAvailable,
            6 => ErrorCode::AlreadyReturned,
            7 => ErrorCode::BadValue,
            _ => ErrorCode::Failure,
        })
    }
}
