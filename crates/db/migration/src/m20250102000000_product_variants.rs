use sea_orm_migration::{prelude::*, sea_orm::DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(ProductVariants::Table)
                    .col(pk_id_col(manager, ProductVariants::Id))
                    .col(fk_id_col(manager, ProductVariants::ProductId))
                    .col(fk_id_col(manager, ProductVariants::ColorId))
                    .col(fk_id_col(manager, ProductVariants::SizeId))
                    .col(
                        ColumnDef::new(ProductVariants::Stock)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(
                        ColumnDef::new(ProductVariants::Sku)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductVariants::Images).json().null())
                    .col(dimension_col(ProductVariants::Weight))
                    .col(dimension_col(ProductVariants::Height))
                    .col(dimension_col(ProductVariants::Width))
                    .col(dimension_col(ProductVariants::Depth))
                    .col(timestamp_col(ProductVariants::CreatedAt))
                    .col(timestamp_col(ProductVariants::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_variants_product_id")
                            .from(ProductVariants::Table, ProductVariants::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_variants_color_id")
                            .from(ProductVariants::Table, ProductVariants::ColorId)
                            .to(Colors::Table, Colors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_variants_size_id")
                            .from(ProductVariants::Table, ProductVariants::SizeId)
                            .to(Sizes::Table, Sizes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The unique index is the authoritative guard against concurrent duplicate SKUs.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_product_variants_sku")
                    .table(ProductVariants::Table)
                    .col(ProductVariants::Sku)
                    .unique()
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_product_variants_product_id", ProductVariants::ProductId),
            ("idx_product_variants_color_id", ProductVariants::ColorId),
            ("idx_product_variants_size_id", ProductVariants::SizeId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(ProductVariants::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ProductVariants::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn dimension_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).decimal_len(8, 2).null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden, Clone, Copy)]
enum ProductVariants {
    Table,
    Id,
    ProductId,
    ColorId,
    SizeId,
    Stock,
    Sku,
    Images,
    Weight,
    Height,
    Width,
    Depth,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
}

#[derive(Iden)]
enum Colors {
    Table,
    Id,
}

#[derive(Iden)]
enum Sizes {
    Table,
    Id,
}
