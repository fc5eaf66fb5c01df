//! Access key entity model
//!
//! Stores only the one-way hash and a display thumbnail of an issued key; the
//! secret value exists solely in the issuance response. The only mutable
//! field is revoke_time, which transitions once from null to a timestamp.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// Bearer access key scoped to a (user, organization) pair
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "access_keys")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Caller-supplied label (optional)
    pub name: Option<String>,

    /// SHA-256 hex digest of the secret value, used for lookup
    pub key_hash: String,

    /// Non-secret display fragment so a user can tell keys apart
    pub thumbnail: String,

    /// Timestamp when the key was issued
    pub create_time: DateTimeWithTimeZone,

    /// Timestamp when the key was revoked; null while active
    pub revoke_time: Option<DateTimeWithTimeZone>,

    pub user_id: i64,
    pub organization_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
