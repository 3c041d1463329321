use std::str::FromStr;

use axum::{
    Extension, Json, Router,
    extract::{Multipart, Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::{
    models::product_variant::{
        ProductVariant, ProductVariantError, ProductVariantPage, VariantListQuery,
    },
    types::VariantField,
};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::{
    admin_schema::{AdminSchema, admin_schema},
    image_storage::UploadedImage,
    variant_intake::VariantForm,
};
use utils_core::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::load_product_variant_middleware};

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

/// Reads a `multipart/form-data` body into a form. File parts may be named
/// `images`, `images[]` or `images[N]`; unknown parts are ignored.
pub async fn read_variant_form(mut multipart: Multipart) -> Result<VariantForm, ApiError> {
    let mut form = VariantForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(|name| name.split('[').next().unwrap_or(name).to_string())
        else {
            continue;
        };

        match VariantField::from_str(&name) {
            Ok(VariantField::Images) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers submit an empty part for a file input left blank.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.images.push(UploadedImage {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Ok(variant_field) => {
                let value = field.text().await?;
                form.set_text(variant_field, value);
            }
            Err(_) => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}

pub async fn get_product_variants(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<VariantListQuery>,
) -> Result<ResponseJson<ApiResponse<ProductVariantPage>>, ApiError> {
    let page = ProductVariant::list(&deployment.db().pool, &query).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub async fn create_product_variant(
    State(deployment): State<DeploymentImpl>,
    multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<ProductVariant>>, ApiError> {
    let form = read_variant_form(multipart).await?;
    let variant = deployment
        .variant_intake()
        .create(&deployment.db().pool, &form)
        .await?;

    Ok(ResponseJson(ApiResponse::success(variant)))
}

pub async fn get_product_variant_schema(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<AdminSchema>> {
    let schema = admin_schema(deployment.variant_intake().max_image_kb());
    ResponseJson(ApiResponse::success(schema))
}

pub async fn get_product_variant(
    Extension(variant): Extension<ProductVariant>,
) -> Result<ResponseJson<ApiResponse<ProductVariant>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(variant)))
}

/// Removes the record. Its image files stay on the public disk.
pub async fn delete_product_variant(
    Extension(variant): Extension<ProductVariant>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let removed = ProductVariant::delete(&deployment.db().pool, variant.id).await?;
    if removed == 0 {
        return Err(ProductVariantError::NotFound.into());
    }
    tracing::info!(id = variant.id, sku = %variant.sku, "Deleted product variant");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn bulk_delete_product_variants(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<ResponseJson<ApiResponse<BulkDeleteResponse>>, ApiError> {
    if payload.ids.is_empty() {
        return Err(ApiError::BadRequest("No product variants selected".to_string()));
    }
    let deleted = ProductVariant::delete_many(&deployment.db().pool, &payload.ids).await?;
    tracing::info!(requested = payload.ids.len(), deleted, "Bulk deleted product variants");
    Ok(ResponseJson(ApiResponse::success(BulkDeleteResponse { deleted })))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let variant_router = Router::new()
        .route(
            "/",
            get(get_product_variant).delete(delete_product_variant),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_product_variant_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_product_variants).post(create_product_variant))
        .route("/schema", get(get_product_variant_schema))
        .route("/bulk-delete", post(bulk_delete_product_variants))
        .nest("/{variant_id}", variant_router);

    Router::new().nest("/product-variants", inner)
}
