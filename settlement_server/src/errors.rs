use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use settlement_engine::{
    cart_objects::CartReport,
    CatalogApiError,
    OrderApiError,
    PaymentFlowError,
    SettlementError,
    StoreError,
};
use thiserror::Error;

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The cart is invalid. {}", .0.summary())]
    InvalidCart(CartReport),
    #[error("The request cannot be processed. {0}")]
    Unprocessable(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Conflict. {0}")]
    Conflict(String),
    #[error("The payment gateway could not complete the request. {0}")]
    GatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
            },
            Self::InvalidCart(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::InvalidCart(report) => serde_json::to_string(&JsonResponse::failure_with_data(self, report)),
            _ => serde_json::to_string(&JsonResponse::failure(self)),
        };
        let body = body.unwrap_or_else(|e| {
            error!("💻️ Could not serialize error response. {e}");
            r#"{"success":false,"error":"Internal server error"}"#.to_string()
        });
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body)
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("The webhook signature is missing or invalid.")]
    InvalidSignature,
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SellerNotFound(_)
            | StoreError::ProductNotFound(_)
            | StoreError::OrderNotFound(_)
            | StoreError::TransferNotFound(_) => Self::NoRecordFound(e.to_string()),
            StoreError::OrderAlreadyExists(_) => Self::Conflict(e.to_string()),
            StoreError::InvalidData(_) => Self::Unprocessable(e.to_string()),
            StoreError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::Validation(report) => Self::InvalidCart(report),
            PaymentFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentFlowError::Gateway(_) => Self::GatewayError(e.to_string()),
            PaymentFlowError::PaymentStatusConflict(_) => Self::Conflict(e.to_string()),
            PaymentFlowError::AmountMismatch { .. } => Self::Conflict(e.to_string()),
            PaymentFlowError::InvalidSignature => Self::AuthenticationError(AuthError::InvalidSignature),
            PaymentFlowError::InvalidWebhook(_) => Self::InvalidRequestBody(e.to_string()),
            PaymentFlowError::OrphanedSession { .. } => Self::BackendError(e.to_string()),
            PaymentFlowError::StoreError(e) => e.into(),
        }
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::OrderNotFound(_)
            | SettlementError::SellerNotFound(_)
            | SettlementError::TransferNotFound(_) => Self::NoRecordFound(e.to_string()),
            SettlementError::NotTransferOwner(_) => Self::InsufficientPermissions(e.to_string()),
            SettlementError::OrderNotPaid(..) | SettlementError::TransferNotRetryable { .. } => {
                Self::Conflict(e.to_string())
            },
            SettlementError::MissingPayoutDetails(_) => Self::Unprocessable(e.to_string()),
            SettlementError::Gateway(_) => Self::GatewayError(e.to_string()),
            SettlementError::StoreError(e) => e.into(),
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderApiError::NotOrderSeller { .. } => Self::InsufficientPermissions(e.to_string()),
            OrderApiError::PaymentNotSuccessful(_)
            | OrderApiError::InvalidTransition { .. }
            | OrderApiError::ConcurrentModification(_) => Self::Conflict(e.to_string()),
            OrderApiError::StoreError(e) => e.into(),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::SellerNotFound(_) | CatalogApiError::ProductNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            CatalogApiError::InvalidProduct(_) | CatalogApiError::InvalidPayoutDetails(_) => {
                Self::Unprocessable(e.to_string())
            },
            CatalogApiError::StoreError(e) => e.into(),
        }
    }
}
