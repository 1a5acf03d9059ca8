//! Migration to create the equipment table.
//!
//! One row per rentable listing. Category and duty type are stored as their
//! lowercase tags; price and per-day rent as double precision.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Equipment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Equipment::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Equipment::Name).text().not_null())
                    .col(ColumnDef::new(Equipment::Brand).text().null())
                    .col(ColumnDef::new(Equipment::Price).double().not_null())
                    .col(ColumnDef::new(Equipment::Rent).double().not_null())
                    .col(ColumnDef::new(Equipment::Category).text().not_null())
                    .col(ColumnDef::new(Equipment::DutyType).text().not_null())
                    .col(ColumnDef::new(Equipment::Description).text().not_null())
                    .col(ColumnDef::new(Equipment::Image).text().null())
                    .col(
                        ColumnDef::new(Equipment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Equipment::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_equipment_category")
                    .table(Equipment::Table)
                    .col(Equipment::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_equipment_category").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Equipment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Equipment {
    Table,
    Id,
    Name,
    Brand,
    Price,
    Rent,
    Category,
    DutyType,
    Description,
    Image,
    CreatedAt,
    UpdatedAt,
}
