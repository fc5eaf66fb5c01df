//! Balance entity model
//!
//! Append-only checkpoints of an organization's running balance. The row with
//! the maximum id per organization is the current balance; the usage sums
//! cover activity strictly since the previous checkpoint.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "balances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub organization_id: i64,

    /// Snapshot instant; the checkpoint window is (previous, timestamp]
    pub timestamp: DateTimeWithTimeZone,

    pub prompt_token_sum: i64,
    pub response_token_sum: i64,

    /// Signed running total after folding the window's activity
    pub balance: f64,
    pub currency: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
