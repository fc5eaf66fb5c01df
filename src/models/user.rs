//! User entity model
//!
//! Ids use the same random-draw scheme as organizations.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// User entity; belongs to organizations through memberships
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Opaque unique identifier (primary key, randomly drawn)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    /// Unique username, validated against the account-name pattern
    #[sea_orm(unique)]
    pub username: String,

    /// Primary email, validated for shape and unique
    #[sea_orm(unique)]
    pub email: String,

    pub company: Option<String>,
    pub location: Option<String>,
    pub social_profile: Option<String>,

    /// Timestamp when the user was created
    pub create_time: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::membership::Entity")]
    Membership,
    #[sea_orm(has_many = "super::access_key::Entity")]
    AccessKey,
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
