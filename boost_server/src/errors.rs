use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use boost_engine::{ClaimError, CommissionError, LedgerError, PaymentEventError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The service is temporarily unavailable. {0}")]
    ServiceUnavailable(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::InvalidSignature(_) => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    TokenExpired,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Request signature is invalid. {0}")]
    InvalidSignature(String),
}

impl From<ClaimError> for ServerError {
    fn from(e: ClaimError) -> Self {
        let message = e.user_message();
        match e {
            ClaimError::AlreadyAssigned(_) => Self::Conflict(message),
            ClaimError::NotPayable { .. } => Self::UnprocessableEntity(message),
            ClaimError::OrderNotFound(_) => Self::NoRecordFound(message),
            ClaimError::SettlementFailed(..) | ClaimError::Transient(_) => {
                error!("💻️ Claim failed. {e}");
                Self::ServiceUnavailable(message)
            },
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            LedgerError::InvalidTransition { .. } => Self::Conflict(e.to_string()),
            LedgerError::IllegalTransition { .. } => Self::UnprocessableEntity(e.to_string()),
            LedgerError::WorkerNotAssigned { .. } => Self::InsufficientPermissions(e.to_string()),
            LedgerError::InvalidPrice(_) | LedgerError::InvalidPercentage(_) => Self::InvalidRequestBody(e.to_string()),
            LedgerError::DatabaseError(_) | LedgerError::InconsistentData(_) => {
                error!("💻️ Backend failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<CommissionError> for ServerError {
    fn from(e: CommissionError) -> Self {
        match e {
            CommissionError::InvalidPercentage(_) => Self::InvalidRequestBody(e.to_string()),
            CommissionError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<PaymentEventError> for ServerError {
    fn from(e: PaymentEventError) -> Self {
        match e {
            PaymentEventError::InvalidPayload(_) | PaymentEventError::MissingProviderId => {
                Self::InvalidRequestBody(e.to_string())
            },
            PaymentEventError::Store(e) => {
                error!("💻️ Could not store a payment event. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}
