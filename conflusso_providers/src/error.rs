use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// A backend answered with a non-success status.
#[derive(Debug, Error)]
#[error("{service} returned {status}: {message}")]
pub struct ApiError {
    pub service: &'static str,
    pub status: StatusCode,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ApiError {
    /// Build from a response body, preferring the `error.message` field both
    /// backends use.
    #[must_use]
    pub fn from_body(service: &'static str, status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map_or_else(|_| body.trim().to_string(), |e| e.error.message);
        Self {
            service,
            status,
            message,
        }
    }
}

/// Check the status and decode the JSON body.
pub(crate) async fn decode<T>(service: &'static str, response: reqwest::Response) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_body(service, status, &body).into());
    }
    Ok(response.json::<T>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_is_extracted() {
        let err = ApiError::from_body(
            "openai",
            StatusCode::NOT_FOUND,
            r#"{"error": {"message": "No assistant found with id 'asst_x'.", "type": "invalid_request_error"}}"#,
        );
        assert_eq!(err.message, "No assistant found with id 'asst_x'.");
        assert_eq!(
            err.to_string(),
            "openai returned 404 Not Found: No assistant found with id 'asst_x'."
        );
    }

    #[test]
    fn raw_body_is_kept_when_not_json() {
        let err = ApiError::from_body("gemini", StatusCode::BAD_GATEWAY, " upstream down \n");
        assert_eq!(err.message, "upstream down");
    }
}
