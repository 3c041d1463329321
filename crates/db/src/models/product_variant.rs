use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    FromQueryResult, JsonValue, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, SqlErr,
};
use sea_orm::sea_query::{Expr, ExprTrait, Func, IntoColumnRef, JoinType, Order};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    entities::{color, product, product_variant, size},
    retry::retry_on_sqlite_busy,
    types::{SortDirection, VariantSortField},
};

const DEFAULT_PER_PAGE: u64 = 25;
const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Error)]
pub enum ProductVariantError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("SKU already exists: {0}")]
    DuplicateSku(String),
    #[error("Product variant not found")]
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub color_id: i64,
    pub size_id: i64,
    pub stock: i32,
    pub sku: String,
    /// Public URLs of the stored images, in upload order.
    pub images: Vec<String>,
    pub weight: Option<Decimal>,
    pub height: Option<Decimal>,
    pub width: Option<Decimal>,
    pub depth: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateProductVariant {
    pub product_id: i64,
    pub color_id: i64,
    pub size_id: i64,
    pub stock: i32,
    pub sku: String,
    pub images: Vec<String>,
    pub weight: Option<Decimal>,
    pub height: Option<Decimal>,
    pub width: Option<Decimal>,
    pub depth: Option<Decimal>,
}

/// A variant row as shown in the admin table, with its parents' names.
#[derive(Debug, Clone, Serialize)]
pub struct ProductVariantListItem {
    #[serde(flatten)]
    pub variant: ProductVariant,
    pub product_name: String,
    pub color_name: String,
    pub size_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductVariantPage {
    pub items: Vec<ProductVariantListItem>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantListQuery {
    pub search: Option<String>,
    pub sort: Option<VariantSortField>,
    pub direction: Option<SortDirection>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, FromQueryResult)]
struct ProductVariantListRow {
    id: i64,
    product_id: i64,
    color_id: i64,
    size_id: i64,
    stock: i32,
    sku: String,
    images: Option<JsonValue>,
    weight: Option<Decimal>,
    height: Option<Decimal>,
    width: Option<Decimal>,
    depth: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_name: String,
    color_name: String,
    size_name: String,
}

fn decode_images(value: Option<JsonValue>) -> Vec<String> {
    match value {
        Some(JsonValue::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                JsonValue::String(url) => Some(url),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn encode_images(images: &[String]) -> Option<JsonValue> {
    if images.is_empty() {
        None
    } else {
        Some(JsonValue::Array(
            images.iter().cloned().map(JsonValue::String).collect(),
        ))
    }
}

impl ProductVariant {
    fn from_model(model: product_variant::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            color_id: model.color_id,
            size_id: model.size_id,
            stock: model.stock,
            sku: model.sku,
            images: decode_images(model.images),
            weight: model.weight,
            height: model.height,
            width: model.width,
            depth: model.depth,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    fn from_list_row(row: ProductVariantListRow) -> ProductVariantListItem {
        ProductVariantListItem {
            variant: Self {
                id: row.id,
                product_id: row.product_id,
                color_id: row.color_id,
                size_id: row.size_id,
                stock: row.stock,
                sku: row.sku,
                images: decode_images(row.images),
                weight: row.weight,
                height: row.height,
                width: row.width,
                depth: row.depth,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            product_name: row.product_name,
            color_name: row.color_name,
            size_name: row.size_name,
        }
    }

    /// Inserts a variant. A unique-index violation on `sku` is reported as
    /// [`ProductVariantError::DuplicateSku`], which is how concurrent creations
    /// racing on the same SKU are detected.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateProductVariant,
    ) -> Result<Self, ProductVariantError> {
        let now = Utc::now();
        let active = product_variant::ActiveModel {
            product_id: Set(data.product_id),
            color_id: Set(data.color_id),
            size_id: Set(data.size_id),
            stock: Set(data.stock),
            sku: Set(data.sku.clone()),
            images: Set(encode_images(&data.images)),
            weight: Set(data.weight),
            height: Set(data.height),
            width: Set(data.width),
            depth: Set(data.depth),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match retry_on_sqlite_busy(|| active.clone().insert(db)).await {
            Ok(model) => Ok(Self::from_model(model)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ProductVariantError::DuplicateSku(data.sku.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = product_variant::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_sku<C: ConnectionTrait>(
        db: &C,
        sku: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = product_variant::Entity::find()
            .filter(product_variant::Column::Sku.eq(sku))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn sku_exists<C: ConnectionTrait>(db: &C, sku: &str) -> Result<bool, DbErr> {
        let count = product_variant::Entity::find()
            .filter(product_variant::Column::Sku.eq(sku))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        product_variant::Entity::find().count(db).await
    }

    /// Lists variants joined with their product, color and size names,
    /// filtered by `search` and ordered by the requested column.
    pub async fn list<C: ConnectionTrait>(
        db: &C,
        query: &VariantListQuery,
    ) -> Result<ProductVariantPage, DbErr> {
        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let page = Ord::max(query.page.unwrap_or(1), 1);

        let mut select = product_variant::Entity::find()
            .join(JoinType::InnerJoin, product_variant::Relation::Product.def())
            .join(JoinType::InnerJoin, product_variant::Relation::Color.def())
            .join(JoinType::InnerJoin, product_variant::Relation::Size.def());

        if let Some(search) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
        {
            let pattern = format!("%{}%", search.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(lower_like((product::Entity, product::Column::Name), &pattern))
                    .add(lower_like((color::Entity, color::Column::Name), &pattern))
                    .add(lower_like((size::Entity, size::Column::Name), &pattern))
                    .add(lower_like(
                        (product_variant::Entity, product_variant::Column::Sku),
                        &pattern,
                    )),
            );
        }

        let total = select.clone().count(db).await?;

        let order = match query.direction.unwrap_or_default() {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        let select = match query.sort.unwrap_or_default() {
            VariantSortField::ProductName => select.order_by(product::Column::Name, order.clone()),
            VariantSortField::ColorName => select.order_by(color::Column::Name, order.clone()),
            VariantSortField::SizeName => select.order_by(size::Column::Name, order.clone()),
            VariantSortField::Stock => {
                select.order_by(product_variant::Column::Stock, order.clone())
            }
            VariantSortField::Weight => {
                select.order_by(product_variant::Column::Weight, order.clone())
            }
            VariantSortField::Height => {
                select.order_by(product_variant::Column::Height, order.clone())
            }
            VariantSortField::Width => {
                select.order_by(product_variant::Column::Width, order.clone())
            }
            VariantSortField::Depth => {
                select.order_by(product_variant::Column::Depth, order.clone())
            }
            VariantSortField::CreatedAt => {
                select.order_by(product_variant::Column::CreatedAt, order.clone())
            }
            VariantSortField::UpdatedAt => {
                select.order_by(product_variant::Column::UpdatedAt, order.clone())
            }
        };

        // Pages past the addressable range are empty.
        let offset = (page - 1)
            .checked_mul(per_page)
            .filter(|offset| i64::try_from(*offset).is_ok());
        let rows = match offset {
            Some(offset) => {
                select
                    .order_by(product_variant::Column::Id, order)
                    .column_as(product::Column::Name, "product_name")
                    .column_as(color::Column::Name, "color_name")
                    .column_as(size::Column::Name, "size_name")
                    .offset(offset)
                    .limit(per_page)
                    .into_model::<ProductVariantListRow>()
                    .all(db)
                    .await?
            }
            None => Vec::new(),
        };

        Ok(ProductVariantPage {
            items: rows.into_iter().map(Self::from_list_row).collect(),
            total,
            page,
            per_page,
        })
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = product_variant::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_many<C: ConnectionTrait>(db: &C, ids: &[i64]) -> Result<u64, DbErr> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = product_variant::Entity::delete_many()
            .filter(product_variant::Column::Id.is_in(ids.to_vec()))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

/// Case-insensitive substring match; `LIKE` alone is case-sensitive on Postgres.
fn lower_like(column: impl IntoColumnRef, pattern: &str) -> Expr {
    Func::lower(Expr::col(column)).like(pattern)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        DBService,
        models::{
            color::{Color, CreateColor},
            product::{CreateProduct, Product},
            size::{CreateSize, Size},
        },
    };

    struct Fixture {
        _dir: TempDir,
        db: DBService,
        product_id: i64,
        color_id: i64,
        size_id: i64,
    }

    async fn setup() -> Fixture {
        let dir = TempDir::new().unwrap();
        let db = DBService::new_with_url(&test_support::sqlite_url(dir.path()))
            .await
            .unwrap();
        let product = Product::create(
            &db.pool,
            &CreateProduct {
                name: "Oxford Shirt".to_string(),
            },
        )
        .await
        .unwrap();
        let color = Color::create(
            &db.pool,
            &CreateColor {
                name: "Red".to_string(),
            },
        )
        .await
        .unwrap();
        let size = Size::create(
            &db.pool,
            &CreateSize {
                name: "L".to_string(),
            },
        )
        .await
        .unwrap();

        Fixture {
            _dir: dir,
            db,
            product_id: product.id,
            color_id: color.id,
            size_id: size.id,
        }
    }

    fn new_variant(fixture: &Fixture, sku: &str) -> CreateProductVariant {
        CreateProductVariant {
            product_id: fixture.product_id,
            color_id: fixture.color_id,
            size_id: fixture.size_id,
            stock: 10,
            sku: sku.to_string(),
            images: Vec::new(),
            weight: None,
            height: None,
            width: None,
            depth: None,
        }
    }

    #[tokio::test]
    async fn create_persists_images_and_dimensions() {
        let fixture = setup().await;
        let mut data = new_variant(&fixture, "RED-L-001");
        data.images = vec![
            "/storage/images/a/front.jpg".to_string(),
            "/storage/images/b/back.png".to_string(),
        ];
        data.weight = Some(Decimal::from_str("1.25").unwrap());
        data.depth = Some(Decimal::from_str("30.5").unwrap());

        let created = ProductVariant::create(&fixture.db.pool, &data).await.unwrap();
        let loaded = ProductVariant::find_by_id(&fixture.db.pool, created.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.sku, "RED-L-001");
        assert_eq!(loaded.stock, 10);
        assert_eq!(loaded.images, data.images);
        assert_eq!(loaded.weight, Some(Decimal::from_str("1.25").unwrap()));
        assert_eq!(loaded.depth, Some(Decimal::from_str("30.5").unwrap()));
        assert_eq!(loaded.height, None);
    }

    #[tokio::test]
    async fn variant_without_images_reads_back_empty() {
        let fixture = setup().await;
        let created = ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "NO-IMG"))
            .await
            .unwrap();

        let loaded = ProductVariant::find_by_sku(&fixture.db.pool, "NO-IMG")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id, created.id);
        assert!(loaded.images.is_empty());
    }

    #[tokio::test]
    async fn duplicate_sku_is_rejected_by_unique_index() {
        let fixture = setup().await;
        ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "DUP-1"))
            .await
            .unwrap();

        let err = ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "DUP-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductVariantError::DuplicateSku(sku) if sku == "DUP-1"));
        assert_eq!(ProductVariant::count(&fixture.db.pool).await.unwrap(), 1);
        assert!(ProductVariant::sku_exists(&fixture.db.pool, "DUP-1").await.unwrap());
        assert!(!ProductVariant::sku_exists(&fixture.db.pool, "DUP-2").await.unwrap());
    }

    #[tokio::test]
    async fn deleting_parent_cascades_to_variants() {
        let fixture = setup().await;
        ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "CASCADE-1"))
            .await
            .unwrap();

        let removed = Product::delete(&fixture.db.pool, fixture.product_id)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(ProductVariant::count(&fixture.db.pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_color_or_size_cascades_to_variants() {
        let fixture = setup().await;
        ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "CASCADE-2"))
            .await
            .unwrap();
        Size::delete(&fixture.db.pool, fixture.size_id).await.unwrap();
        assert_eq!(ProductVariant::count(&fixture.db.pool).await.unwrap(), 0);

        let fixture = setup().await;
        ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "CASCADE-3"))
            .await
            .unwrap();
        Color::delete(&fixture.db.pool, fixture.color_id).await.unwrap();
        assert_eq!(ProductVariant::count(&fixture.db.pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_searches_parent_names_and_sku() {
        let fixture = setup().await;
        let blue = Color::create(
            &fixture.db.pool,
            &CreateColor {
                name: "Blue".to_string(),
            },
        )
        .await
        .unwrap();
        ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "SHIRT-RED"))
            .await
            .unwrap();
        let mut blue_variant = new_variant(&fixture, "SHIRT-BLUE");
        blue_variant.color_id = blue.id;
        ProductVariant::create(&fixture.db.pool, &blue_variant)
            .await
            .unwrap();

        let by_color = ProductVariant::list(
            &fixture.db.pool,
            &VariantListQuery {
                search: Some("blue".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_color.total, 1);
        assert_eq!(by_color.items[0].variant.sku, "SHIRT-BLUE");
        assert_eq!(by_color.items[0].color_name, "Blue");
        assert_eq!(by_color.items[0].product_name, "Oxford Shirt");
        assert_eq!(by_color.items[0].size_name, "L");

        let by_product = ProductVariant::list(
            &fixture.db.pool,
            &VariantListQuery {
                search: Some("Oxford".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_product.total, 2);

        let by_sku = ProductVariant::list(
            &fixture.db.pool,
            &VariantListQuery {
                search: Some("RED".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_sku.total, 1);
        assert_eq!(by_sku.items[0].variant.sku, "SHIRT-RED");
    }

    #[tokio::test]
    async fn list_sorts_and_paginates() {
        let fixture = setup().await;
        for (sku, stock) in [("S-1", 5), ("S-2", 1), ("S-3", 9)] {
            let mut data = new_variant(&fixture, sku);
            data.stock = stock;
            ProductVariant::create(&fixture.db.pool, &data).await.unwrap();
        }

        let ascending = ProductVariant::list(
            &fixture.db.pool,
            &VariantListQuery {
                sort: Some(VariantSortField::Stock),
                direction: Some(SortDirection::Asc),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let stocks: Vec<i32> = ascending
            .items
            .iter()
            .map(|item| item.variant.stock)
            .collect();
        assert_eq!(stocks, vec![1, 5, 9]);

        let second_page = ProductVariant::list(
            &fixture.db.pool,
            &VariantListQuery {
                sort: Some(VariantSortField::Stock),
                direction: Some(SortDirection::Desc),
                page: Some(2),
                per_page: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(second_page.total, 3);
        assert_eq!(second_page.page, 2);
        assert_eq!(second_page.items.len(), 1);
        assert_eq!(second_page.items[0].variant.stock, 1);
    }

    #[tokio::test]
    async fn list_search_ignores_case() {
        let fixture = setup().await;
        ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "SHIRT-RED"))
            .await
            .unwrap();

        for search in ["shirt-red", "OXFORD", "rEd"] {
            let page = ProductVariant::list(
                &fixture.db.pool,
                &VariantListQuery {
                    search: Some(search.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            assert_eq!(page.total, 1, "search {search}");
        }
    }

    #[tokio::test]
    async fn list_page_beyond_range_is_empty() {
        let fixture = setup().await;
        ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "FAR-1"))
            .await
            .unwrap();

        let page = ProductVariant::list(
            &fixture.db.pool,
            &VariantListQuery {
                page: Some(u64::MAX),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.page, u64::MAX);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn delete_many_removes_selected_rows() {
        let fixture = setup().await;
        let a = ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "DEL-A"))
            .await
            .unwrap();
        let b = ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "DEL-B"))
            .await
            .unwrap();
        let c = ProductVariant::create(&fixture.db.pool, &new_variant(&fixture, "DEL-C"))
            .await
            .unwrap();

        let removed = ProductVariant::delete_many(&fixture.db.pool, &[a.id, b.id])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(ProductVariant::delete_many(&fixture.db.pool, &[]).await.unwrap(), 0);
        assert_eq!(ProductVariant::delete(&fixture.db.pool, c.id).await.unwrap(), 1);
        assert_eq!(ProductVariant::delete(&fixture.db.pool, c.id).await.unwrap(), 0);
        assert_eq!(ProductVariant::count(&fixture.db.pool).await.unwrap(), 0);
    }
}
