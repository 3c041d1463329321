use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{DbErr, models::product_variant::ProductVariantError};
use deployment::DeploymentError;
use services::services::{
    config::ConfigError,
    image_storage::ImageStorageError,
    variant_intake::{IntakeError, ValidationErrors},
};
use thiserror::Error;
use utils_core::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    ProductVariant(#[from] ProductVariantError),
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<&'static str> for ApiError {
    fn from(msg: &'static str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::ProductVariant(err) => match err {
                ProductVariantError::NotFound => (StatusCode::NOT_FOUND, "ProductVariantError"),
                ProductVariantError::DuplicateSku(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "ProductVariantError")
                }
                ProductVariantError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "ProductVariantError")
                }
            },
            ApiError::Intake(err) => match err {
                IntakeError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError"),
                IntakeError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "StorageError"),
                IntakeError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Deployment(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DeploymentError"),
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ConfigError"),
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MultipartError"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IoError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        };

        let error_message = match &self {
            ApiError::ProductVariant(ProductVariantError::NotFound) => {
                "Product variant not found.".to_string()
            }
            ApiError::ProductVariant(ProductVariantError::DuplicateSku(_)) => {
                "The SKU has already been taken.".to_string()
            }
            ApiError::Intake(IntakeError::Validation(_)) => "The given data was invalid.".to_string(),
            ApiError::Intake(IntakeError::Storage(storage_err)) => match storage_err {
                ImageStorageError::Io(_) => {
                    "Failed to store the uploaded images. Please try again.".to_string()
                }
                ImageStorageError::InvalidPath(_) => {
                    "Image storage is misconfigured.".to_string()
                }
            },
            ApiError::Multipart(_) => {
                "Failed to read the upload. Please ensure the files are valid and try again."
                    .to_string()
            }
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::Internal(msg) => msg.clone(),
            ApiError::BadRequest(msg) => msg.clone(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }

        match self {
            ApiError::Intake(IntakeError::Validation(errors)) => {
                let response =
                    ApiResponse::<(), ValidationErrors>::error_with_data(&error_message, errors);
                (status_code, Json(response)).into_response()
            }
            _ => {
                let response = ApiResponse::<()>::error(&error_message);
                (status_code, Json(response)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use services::services::variant_intake::FieldErrorKind;

    use super::*;

    #[test]
    fn api_error_maps_to_expected_http_statuses() {
        assert_eq!(
            ApiError::BadRequest("bad".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("missing".to_string())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Database(DbErr::Custom("boom".to_string()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn intake_errors_map_to_expected_http_statuses() {
        assert_eq!(
            ApiError::from(IntakeError::Validation(ValidationErrors::default()))
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(IntakeError::Storage(ImageStorageError::Io(
                std::io::Error::other("disk full")
            )))
            .into_response()
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(ProductVariantError::NotFound)
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn validation_errors_are_returned_as_error_data() {
        let mut errors = ValidationErrors::default();
        errors.add("sku", FieldErrorKind::Required, "The sku field is required.");

        let response = ApiError::from(IntakeError::Validation(errors)).into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "The given data was invalid.");
        assert_eq!(json["error_data"]["sku"][0]["kind"], "required");
    }
}
