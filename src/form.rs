// Client side of the player submission: editable form state and the HTTP submit.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, Serializer};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8888";

pub const NO_ANALYSIS_ERROR: &str = "No analysis was returned from the API";
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Editable form state, serialized as-is for submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerForm {
    pub age: u32,
    pub position: String,
    #[serde(serialize_with = "whole_as_integer")]
    pub weight: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub height: f64,
    pub description: String,
}

/// Writes `110.0` as `110` so the server echoes what the player typed.
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

impl Default for PlayerForm {
    fn default() -> Self {
        Self {
            age: 18,
            position: String::new(),
            weight: 80.0,
            height: 180.0,
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("unknown form field '{0}'")]
    UnknownField(String),
    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} {reason}, got '{value}'")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
        value: String,
    },
}

impl PlayerForm {
    /// Update one field from raw text input.
    ///
    /// `age`, `weight` and `height` are coerced to numbers; blank input becomes
    /// zero and is left for the server to reject.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        match name {
            "age" => self.age = coerce_age(raw)?,
            "weight" => self.weight = coerce_number("weight", raw)?,
            "height" => self.height = coerce_number("height", raw)?,
            "position" => self.position = raw.to_string(),
            "description" => self.description = raw.to_string(),
            other => return Err(FormError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

fn coerce_number(field: &'static str, raw: &str) -> Result<f64, FormError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FormError::NotANumber {
            field,
            value: raw.to_string(),
        })
}

fn coerce_age(raw: &str) -> Result<u32, FormError> {
    let n = coerce_number("age", raw)?;
    let reason = if n < 0.0 {
        "must not be negative"
    } else if n.fract() != 0.0 {
        "must be a whole number"
    } else if n > f64::from(u32::MAX) {
        "is too large"
    } else {
        return Ok(n as u32);
    };
    Err(FormError::OutOfRange {
        field: "age",
        reason,
        value: raw.to_string(),
    })
}

/// Loose view of any response body the server may send back.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub analysis: Option<String>,
    pub source: Option<String>,
    pub error: Option<String>,
    pub details: Option<String>,
    pub openai_error: Option<String>,
}

/// What the user sees after one submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Analysis {
        message: String,
        analysis: String,
        /// True when the server substituted its templated analysis.
        fallback: bool,
    },
    Error {
        message: Option<String>,
        error: String,
    },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },
}

fn submit_failure(reason: impl std::fmt::Display) -> SubmissionOutcome {
    SubmissionOutcome::Error {
        message: None,
        error: format!("Failed to submit player information: {reason}"),
    }
}

/// Map a raw HTTP response onto what should be displayed.
pub fn interpret_response(status: StatusCode, body: &str) -> SubmissionOutcome {
    let parsed = serde_json::from_str::<ApiResponse>(body);

    if !status.is_success() {
        return match parsed {
            Ok(ApiResponse {
                error: Some(error),
                details,
                message,
                ..
            }) => SubmissionOutcome::Error {
                message,
                error: match details {
                    Some(details) => format!("{error}: {details}"),
                    None => error,
                },
            },
            _ => submit_failure(SubmitError::Status {
                status: status.as_u16(),
                body: body.to_string(),
            }),
        };
    }

    let response = match parsed {
        Ok(response) => response,
        Err(e) => return submit_failure(format!("invalid response body: {e}")),
    };

    let message = response.message;
    if !response.success {
        return SubmissionOutcome::Error {
            message,
            error: response.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        };
    }

    match response.analysis.filter(|a| !a.is_empty()) {
        Some(analysis) => SubmissionOutcome::Analysis {
            message: message.unwrap_or_else(|| "Submission successful".to_string()),
            analysis,
            fallback: response.source.as_deref() == Some("fallback")
                || response.openai_error.is_some(),
        },
        None => SubmissionOutcome::Error {
            message,
            error: NO_ANALYSIS_ERROR.to_string(),
        },
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// HTTP client for the player endpoints. One submission at a time.
pub struct PlayerFormClient {
    http: Client,
    base_url: String,
    in_flight: AtomicBool,
}

impl PlayerFormClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the submit control should currently be disabled.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fetch the greeting from `GET /api/hello`.
    pub async fn hello(&self) -> Result<String, SubmitError> {
        let response = self
            .http
            .get(format!("{}/api/hello", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ApiResponse = response.json().await?;
        Ok(body.message.unwrap_or_default())
    }

    /// Send the form to `POST /api/players` once and interpret the reply.
    ///
    /// Fails only when another submission from this client is still running;
    /// every other failure is reported through [`SubmissionOutcome::Error`].
    pub async fn submit(&self, form: &PlayerForm) -> Result<SubmissionOutcome, SubmitError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(SubmitError::AlreadySubmitting)?;

        tracing::debug!("Submitting player form to {}: {form:?}", self.base_url);
        let sent = self
            .http
            .post(format!("{}/api/players", self.base_url))
            .json(form)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => return Ok(submit_failure(e)),
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => Ok(interpret_response(status, &body)),
            Err(e) => Ok(submit_failure(e)),
        }
    }
}
