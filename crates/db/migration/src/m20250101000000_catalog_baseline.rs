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
                    .table(Products::Table)
                    .col(pk_id_col(manager, Products::Id))
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(timestamp_col(Products::CreatedAt))
                    .col(timestamp_col(Products::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Colors::Table)
                    .col(pk_id_col(manager, Colors::Id))
                    .col(ColumnDef::new(Colors::Name).string().not_null())
                    .col(timestamp_col(Colors::CreatedAt))
                    .col(timestamp_col(Colors::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Sizes::Table)
                    .col(pk_id_col(manager, Sizes::Id))
                    .col(ColumnDef::new(Sizes::Name).string().not_null())
                    .col(timestamp_col(Sizes::CreatedAt))
                    .col(timestamp_col(Sizes::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sizes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Colors::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).if_exists().to_owned())
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

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Colors {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Sizes {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}
