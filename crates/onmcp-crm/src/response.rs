//! The `{data, error, status}` result triple shared by every CRM call.

use serde::Serialize;

use crate::error::CrmError;

/// Status sentinel for "the service could not be reached". Distinct from any
/// real HTTP status.
pub const TRANSPORT_FAILURE: u16 = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrmResponse<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub status: u16,
}

impl<T> CrmResponse<T> {
    #[must_use]
    pub fn success(data: T, status: u16) -> Self {
        Self {
            data: Some(data),
            error: None,
            status,
        }
    }

    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
            status,
        }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
            status: TRANSPORT_FAILURE,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }

    /// `true` when the service was never reached (or the call was never made).
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        self.status == TRANSPORT_FAILURE
    }

    /// Convert the triple into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Transport`] for status `0` and
    /// [`CrmError::Rejected`] for any other response without data.
    pub fn into_result(self) -> Result<T, CrmError> {
        if let Some(data) = self.data {
            return Ok(data);
        }
        let message = self
            .error
            .unwrap_or_else(|| "CRM returned no data".to_string());
        if self.status == TRANSPORT_FAILURE {
            Err(CrmError::Transport(message))
        } else {
            Err(CrmError::Rejected {
                status: self.status,
                message,
            })
        }
    }

    /// Transform successful data, turning a conversion failure into a
    /// transport-class error (the body was unusable).
    pub fn and_then<U, F>(self, f: F) -> CrmResponse<U>
    where
        F: FnOnce(T) -> Result<U, String>,
    {
        match self.data {
            Some(data) => match f(data) {
                Ok(mapped) => CrmResponse::success(mapped, self.status),
                Err(message) => CrmResponse::transport(message),
            },
            None => CrmResponse {
                data: None,
                error: self.error,
                status: self.status,
            },
        }
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Looks at `message` (string, or array of strings), then `error` (string,
/// or object with a `message`), and finally falls back to the status line.
pub(crate) fn extract_error_message(
    body: Option<&serde_json::Value>,
    status: reqwest::StatusCode,
) -> String {
    let from_body = body.and_then(|body| {
        match body.get("message") {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(serde_json::Value::Array(items)) => {
                let joined = items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if !joined.is_empty() {
                    return Some(joined);
                }
            }
            _ => {}
        }
        match body.get("error") {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Object(obj)) => obj
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned),
            _ => None,
        }
    });

    from_body.unwrap_or_else(|| {
        format!(
            "Request failed: {}",
            status.canonical_reason().unwrap_or(status.as_str())
        )
    })
}
