use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use db::{DBService, DbErr};
use services::services::{
    config::{Config, ConfigError},
    variant_intake::VariantIntake,
};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Everything a request handler needs, wired up for one environment.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<RwLock<Config>>;

    fn db(&self) -> &DBService;

    fn variant_intake(&self) -> &VariantIntake;

    /// Directory served under `/storage`.
    fn public_storage_dir(&self) -> &Path;
}
