use std::{fmt::Display, future::Future};

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::{DBService, models::product_variant::ProductVariant};
use deployment::Deployment;

use crate::error::ApiError;

pub trait ModelLoaderDeps {
    fn db_service(&self) -> &DBService;
}

impl<D> ModelLoaderDeps for D
where
    D: Deployment,
{
    fn db_service(&self) -> &DBService {
        self.db()
    }
}

async fn fetch_model_or_error<M, E, Fut>(
    model_name: &'static str,
    model_id: i64,
    load_future: Fut,
) -> Result<M, ApiError>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(ApiError::NotFound(format!("{model_name} {model_id} not found")))
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(ApiError::Internal(format!("Failed to fetch {model_name}")))
        }
    }
}

/// Loads the variant named by the `{variant_id}` path segment into the
/// request extensions.
pub async fn load_product_variant_middleware<S>(
    State(deployment): State<S>,
    Path(variant_id): Path<i64>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    let variant = fetch_model_or_error(
        "Product variant",
        variant_id,
        ProductVariant::find_by_id(&deployment.db_service().pool, variant_id),
    )
    .await?;
    request.extensions_mut().insert(variant);
    Ok(next.run(request).await)
}
