use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{message}")]
    Conflict {
        message: String,
        sku: Option<String>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::NotFound(what) => AppError::NotFound(what),
            DomainError::InsufficientStock { ref sku } => AppError::Conflict {
                message: e.to_string(),
                sku: Some(sku.clone()),
            },
            DomainError::CartAlreadyCheckedOut => AppError::Conflict {
                message: e.to_string(),
                sku: None,
            },
            DomainError::Internal(msg) => {
                log::error!("internal error: {}", msg);
                AppError::Internal(msg)
            }
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        log::error!("blocking task failed: {}", e);
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Internal(_) => serde_json::json!({ "error": "Internal server error" }),
            AppError::Conflict {
                sku: Some(sku), ..
            } => serde_json::json!({ "error": self.to_string(), "sku": sku }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;
    use actix_web::ResponseError;

    fn body_json(resp: HttpResponse) -> serde_json::Value {
        let bytes = resp.into_body().try_into_bytes().expect("sized body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn validation_maps_to_400() {
        let err: AppError = DomainError::Validation("invalid email".to_string()).into();
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "invalid email");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err: AppError = DomainError::NotFound("Shipping method".to_string()).into();
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Shipping method not found");
    }

    #[test]
    fn insufficient_stock_maps_to_409_with_sku() {
        let err: AppError = DomainError::InsufficientStock {
            sku: "TEE-RED-M".to_string(),
        }
        .into();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = body_json(resp);
        assert_eq!(body["sku"], "TEE-RED-M");
        assert_eq!(body["error"], "Insufficient stock for SKU TEE-RED-M");
    }

    #[test]
    fn already_checked_out_maps_to_409_without_sku() {
        let err: AppError = DomainError::CartAlreadyCheckedOut.into();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert!(body_json(resp).get("sku").is_none());
    }

    #[test]
    fn internal_error_hides_details() {
        let err: AppError = DomainError::Internal("connection refused".to_string()).into();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp)["error"], "Internal server error");
    }

    #[test]
    fn internal_error_display() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }
}
