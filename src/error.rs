use crate::types::trip::TravelMode;
use thiserror::Error;

/// Longest slice of an unparseable response kept for diagnostics.
pub const PREVIEW_LIMIT: usize = 200;

/// Main error type for the planner
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generation request timed out after {0}s")]
    Timeout(u64),

    #[error("Generation quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Generated content was blocked: {0}")]
    ContentBlocked(String),

    #[error("Generation service error: {0}")]
    Service(String),

    #[error("Response was not valid JSON. Preview: {preview}")]
    MalformedResponse { preview: String },

    #[error("Itinerary is missing essential fields: {}", missing.join(", "))]
    IncompleteItinerary { missing: Vec<&'static str> },

    #[error("Itinerary was generated for {received} instead of requested {requested}")]
    ModeMismatch {
        requested: TravelMode,
        received: String,
    },

    #[error("Invalid itinerary format: {0}")]
    InvalidItinerary(String),

    #[error("Invalid trip details: {0}")]
    InvalidTrip(String),

    #[error("Action `{action}` is not allowed while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Build a `MalformedResponse` from the offending text, keeping only a bounded preview.
    pub fn malformed(text: &str) -> Self {
        PlannerError::MalformedResponse {
            preview: preview(text),
        }
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PlannerError::Configuration(_) => "CONFIGURATION_ERROR",
            PlannerError::Timeout(_) => "TIMEOUT",
            PlannerError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            PlannerError::ContentBlocked(_) => "CONTENT_BLOCKED",
            PlannerError::Service(_) => "SERVICE_ERROR",
            PlannerError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            PlannerError::IncompleteItinerary { .. } => "INCOMPLETE_ITINERARY",
            PlannerError::ModeMismatch { .. } => "MODE_MISMATCH",
            PlannerError::InvalidItinerary(_) => "INVALID_ITINERARY",
            PlannerError::InvalidTrip(_) => "INVALID_TRIP",
            PlannerError::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }

    /// Message shown to the user when the workflow surfaces this error.
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::Configuration(msg) => format!(
                "The planner is not configured: {msg}. Set the API key and try again."
            ),
            PlannerError::Timeout(_) => "API request timed out. Please try again.".to_string(),
            PlannerError::QuotaExceeded(_) => {
                "API request failed: you may have exceeded your quota. Please check your API account."
                    .to_string()
            }
            PlannerError::ContentBlocked(_) => {
                "The generated content was blocked due to safety concerns. Please modify your inputs or try again."
                    .to_string()
            }
            PlannerError::Service(msg) => format!("AI service request failed: {msg}"),
            PlannerError::MalformedResponse { preview } => format!(
                "Failed to parse the itinerary. The AI's response was not valid JSON. Preview: {preview}..."
            ),
            other => other.to_string(),
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.user_message(),
            }
        })
    }
}

/// First `PREVIEW_LIMIT` characters of `text`, cut on a char boundary.
pub(crate) fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_LIMIT) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
