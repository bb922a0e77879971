// src/backend/error.rs
use serde_json::Value;

/// Why a backend call failed. Every variant maps to one user-visible message;
/// none of them is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("backend unreachable: {0}")]
    Connect(String),
    #[error("backend request timed out")]
    Timeout,
    #[error("backend returned HTTP {code}: {message}")]
    Status { code: u16, message: String },
    #[error("backend reported failure: {message}")]
    Rejected { message: String },
    #[error("malformed backend response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Text for the error card. The backend's own `message` wins when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Status { message, .. } | FetchError::Rejected { message }
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            FetchError::Connect(_) => {
                "Unable to connect to the data service. Please check that it is running and try again."
                    .to_string()
            }
            FetchError::Timeout => {
                "The data service took too long to respond. Please try again.".to_string()
            }
            FetchError::Status { code, .. } => {
                format!("The data service returned an error (HTTP {code}).")
            }
            FetchError::Rejected { .. } => {
                "The data service could not complete the request.".to_string()
            }
            FetchError::Decode(_) => {
                "The data service returned data in an unexpected format.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() || e.is_body() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Connect(e.to_string())
        }
    }
}

/// Validate a `{status, data, message}` envelope and return the payload under `data_key`.
///
/// Non-2xx → `Status`; body not JSON → `Decode`; `status != "success"` → `Rejected`.
/// A missing `data_key` yields `Value::Null` and is left to the caller's decoder.
pub fn unwrap_envelope(http_status: u16, body: &str, data_key: &str) -> Result<Value, FetchError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if !(200..300).contains(&http_status) {
        return Err(FetchError::Status {
            code: http_status,
            message,
        });
    }
    let Some(mut v) = parsed else {
        return Err(FetchError::Decode("response body is not JSON".to_string()));
    };
    if v.get("status").and_then(Value::as_str) != Some("success") {
        return Err(FetchError::Rejected { message });
    }
    Ok(v.get_mut(data_key).map(Value::take).unwrap_or(Value::Null))
}
