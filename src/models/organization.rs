//! Organization entity model
//!
//! This module contains the SeaORM entity model for the organizations table.
//! Ids are opaque random draws rather than sequence values, so creation order
//! cannot be inferred from an id.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// Organization entity, the tenant that owns users, keys and a running balance
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    /// Opaque unique identifier (primary key, randomly drawn)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    /// Unique display name, validated against the account-name pattern
    #[sea_orm(unique)]
    pub name: String,

    /// ISO-ish country code (optional)
    pub country_code: Option<String>,

    /// Currency of the organization's balance
    pub currency: String,

    /// Timestamp when the organization was created
    pub create_time: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::membership::Entity")]
    Membership,
    #[sea_orm(has_many = "super::access_key::Entity")]
    AccessKey,
    #[sea_orm(has_many = "super::balance::Entity")]
    Balance,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<super::membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Membership.def()
    }
}

impl Related<super::access_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessKey.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
