use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Classification returned no tier. Unreachable while the tables keep a
/// floor-zero row and the pricing gap falls back to the highest tier; kept as
/// a defensive check and fatal if ever hit.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TierError {
    #[error("no pricing tier covers volume {volume}")]
    PricingTierNotFound { volume: Decimal },
    #[error("no roi tier covers volume {volume}")]
    RoiTierNotFound { volume: Decimal },
}

/// Fatal proposal failures. Warnings (missing data) and the enterprise
/// guardrail are outcomes, not errors; see `domain::proposal`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProposalError {
    #[error(transparent)]
    Tier(#[from] TierError),
    /// Read, upsert, or quote-creation failure against the record store.
    /// Surfaced with the underlying message; never retried automatically.
    #[error("record store failure: {0}")]
    RecordStore(String),
}

impl ProposalError {
    pub fn code(&self) -> FailureCode {
        match self {
            Self::Tier(TierError::PricingTierNotFound { .. }) => FailureCode::PricingError,
            Self::Tier(TierError::RoiTierNotFound { .. }) => FailureCode::RoiError,
            Self::RecordStore(_) => FailureCode::InternalError,
        }
    }

    pub fn into_body(self, correlation_id: impl Into<String>) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
            correlation_id: correlation_id.into(),
        }
    }
}

/// Stable codes surfaced in CLI and API error payloads. `EnterpriseVolume`
/// rides along for callers that want one code space for every non-success
/// outcome, even though the guardrail is not a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    EnterpriseVolume,
    PricingError,
    RoiError,
    MissingData,
    InvalidRequest,
    InternalError,
    WebhookError,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnterpriseVolume => "ENTERPRISE_VOLUME",
            Self::PricingError => "PRICING_ERROR",
            Self::RoiError => "ROI_ERROR",
            Self::MissingData => "MISSING_DATA",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
            Self::WebhookError => "WEBHOOK_ERROR",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EnterpriseVolume => {
                "Automated quoting is disabled at this volume. Route the deal to the enterprise desk."
            }
            Self::PricingError | Self::RoiError => {
                "The order volume could not be classified against the tier tables."
            }
            Self::MissingData => {
                "Some deal fields were missing; figures were computed with zero substitutes."
            }
            Self::InvalidRequest => "The request was malformed; check the deal id.",
            Self::InternalError => "An unexpected internal error occurred.",
            Self::WebhookError => {
                "The document renderer rejected the request. Retry, then check the renderer."
            }
        }
    }
}

/// Boundary error payload; what the HTTP API and CLI print. Failures travel
/// as values to the boundary, never as panics.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub code: FailureCode,
    pub message: String,
    pub correlation_id: String,
}

impl ErrorBody {
    pub fn new(
        code: FailureCode,
        message: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self { code, message: message.into(), correlation_id: correlation_id.into() }
    }
}
