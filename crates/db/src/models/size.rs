use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::size;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Size {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSize {
    pub name: String,
}

impl Size {
    fn from_model(model: size::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = size::Entity::find()
            .order_by_asc(size::Column::Name)
            .order_by_asc(size::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = size::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn exists<C: ConnectionTrait>(db: &C, id: i64) -> Result<bool, DbErr> {
        let count = size::Entity::find_by_id(id).count(db).await?;
        Ok(count > 0)
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateSize) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = size::ActiveModel {
            name: Set(data.name.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Deleting a size cascades to its variants.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = size::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}
