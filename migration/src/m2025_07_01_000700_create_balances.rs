//! Migration to create the balances table.
//!
//! Each row is an append-only checkpoint: the running balance plus the usage
//! accumulated strictly since the previous checkpoint. The latest row per
//! organization (max id) is the current balance.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Balances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Balances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Balances::OrganizationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Balances::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Balances::PromptTokenSum)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Balances::ResponseTokenSum)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Balances::Balance).double().not_null())
                    .col(
                        ColumnDef::new(Balances::Currency)
                            .text()
                            .not_null()
                            .default("USD"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_balances_organization_id")
                            .from(Balances::Table, Balances::OrganizationId)
                            .to(Organizations::Table, Organizations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_balances_organization_id_id")
                    .table(Balances::Table)
                    .col(Balances::OrganizationId)
                    .col(Balances::Id)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_balances_organization_id_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Balances {
    Table,
    Id,
    OrganizationId,
    Timestamp,
    PromptTokenSum,
    ResponseTokenSum,
    Balance,
    Currency,
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
}
