use serde::{Deserialize, Serialize};

/// Machine-readable failure category for structured lookups.
///
/// `InvalidInput` marks a caller error that will never succeed on retry;
/// `NotFound` marks a well-formed identifier with no match, which batch
/// responses report as a non-success rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
}

/// Structured per-identifier outcome used by batch responses and the
/// explicit single-lookup APIs.
///
/// Serializes as `{"success": true, "data": …}` on a hit and
/// `{"success": false, "error": …, "error_code": …}` on a miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOutcome<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl<T> LookupOutcome<T> {
    #[must_use]
    pub fn hit(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::miss(message, ErrorCode::InvalidInput)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::miss(message, ErrorCode::NotFound)
    }

    fn miss(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_code: Some(code),
        }
    }

    #[must_use]
    pub fn into_data(self) -> Option<T> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}
