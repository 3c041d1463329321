use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    config::{Config, load_config_from_file, save_config_to_file},
    image_storage::LocalImageStorage,
    variant_intake::VariantIntake,
};
use tokio::sync::RwLock;
use utils_assets::assets::{config_path, public_storage_dir};

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<RwLock<Config>>,
    db: DBService,
    variant_intake: VariantIntake,
    public_storage_dir: PathBuf,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Self::load_runtime_config().await?;
        let public_storage_dir = public_storage_dir();
        tokio::fs::create_dir_all(&public_storage_dir).await?;

        let db = DBService::new().await?;
        let variant_intake = {
            let config = config.read().await;
            Self::build_variant_intake(&public_storage_dir, &config)
        };

        tracing::info!(
            storage = %public_storage_dir.display(),
            "Local deployment ready"
        );

        Ok(Self {
            config,
            db,
            variant_intake,
            public_storage_dir,
        })
    }

    fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn variant_intake(&self) -> &VariantIntake {
        &self.variant_intake
    }

    fn public_storage_dir(&self) -> &Path {
        &self.public_storage_dir
    }
}

impl LocalDeployment {
    async fn load_runtime_config() -> Result<Arc<RwLock<Config>>, DeploymentError> {
        let config = load_config_from_file(&config_path()).await;
        save_config_to_file(&config, &config_path()).await?;
        Ok(Arc::new(RwLock::new(config)))
    }

    fn build_variant_intake(public_storage_dir: &Path, config: &Config) -> VariantIntake {
        let storage = LocalImageStorage::new(public_storage_dir, &config.storage);
        VariantIntake::from_config(Arc::new(storage), &config.storage)
    }
}
