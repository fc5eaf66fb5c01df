//! Migration to create the access_keys table.
//!
//! Only the one-way hash and a display thumbnail of a key are stored; the
//! secret value itself is never persisted. Revocation sweeps query by
//! revoke_time, so that column is indexed.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessKeys::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessKeys::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccessKeys::Name).text().null())
                    .col(ColumnDef::new(AccessKeys::KeyHash).text().not_null())
                    .col(ColumnDef::new(AccessKeys::Thumbnail).text().not_null())
                    .col(
                        ColumnDef::new(AccessKeys::CreateTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AccessKeys::RevokeTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(AccessKeys::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(AccessKeys::OrganizationId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_access_keys_user_id")
                            .from(AccessKeys::Table, AccessKeys::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_access_keys_organization_id")
                            .from(AccessKeys::Table, AccessKeys::OrganizationId)
                            .to(Organizations::Table, Organizations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_access_keys_revoke_time")
                    .table(AccessKeys::Table)
                    .col(AccessKeys::RevokeTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_access_keys_organization_id")
                    .table(AccessKeys::Table)
                    .col(AccessKeys::OrganizationId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_access_keys_revoke_time").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_access_keys_organization_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AccessKeys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AccessKeys {
    Table,
    Id,
    Name,
    KeyHash,
    Thumbnail,
    CreateTime,
    RevokeTime,
    UserId,
    OrganizationId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
}
