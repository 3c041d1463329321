use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::{color::Color, product::Product, size::Size};
use deployment::Deployment;
use serde::Serialize;
use utils_core::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogOption {
    pub id: i64,
    pub name: String,
}

/// Choices for the product, color and size selects of the variant form.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogOptions {
    pub products: Vec<CatalogOption>,
    pub colors: Vec<CatalogOption>,
    pub sizes: Vec<CatalogOption>,
}

pub async fn get_catalog_options(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<CatalogOptions>>, ApiError> {
    let pool = &deployment.db().pool;
    let products = Product::find_all(pool)
        .await?
        .into_iter()
        .map(|product| CatalogOption {
            id: product.id,
            name: product.name,
        })
        .collect();
    let colors = Color::find_all(pool)
        .await?
        .into_iter()
        .map(|color| CatalogOption {
            id: color.id,
            name: color.name,
        })
        .collect();
    let sizes = Size::find_all(pool)
        .await?
        .into_iter()
        .map(|size| CatalogOption {
            id: size.id,
            name: size.name,
        })
        .collect();

    Ok(ResponseJson(ApiResponse::success(CatalogOptions {
        products,
        colors,
        sizes,
    })))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/catalog/options", get(get_catalog_options))
}
