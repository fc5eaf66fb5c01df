//! # Membership Repository
//!
//! Links users to organizations with a role. Missing users, organizations or
//! memberships are reported as [`Error::NotFound`]; the unique
//! (organization, user) pair surfaces duplicates as [`Error::AlreadyExists`].

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, QuerySelect, Set,
};

use crate::db::server_time;
use crate::error::Error;
use crate::models::membership::{self, Entity as Membership, Role};
use crate::models::organization::Entity as Organization;
use crate::models::user::Entity as User;

/// Repository for Membership database operations
pub struct MembershipRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> MembershipRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Add an existing user to an existing organization.
    ///
    /// The role defaults to member.
    pub async fn add_user_to_organization(
        &self,
        user_id: i64,
        organization_id: i64,
        role: Option<Role>,
    ) -> Result<membership::Model, Error> {
        User::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or_else(|| Error::not_found("user"))?;
        Organization::find_by_id(organization_id)
            .one(self.db)
            .await?
            .ok_or_else(|| Error::not_found("organization"))?;

        let now = server_time(self.db).await?;

        let model = membership::ActiveModel {
            organization_id: Set(organization_id),
            user_id: Set(user_id),
            role: Set(role.unwrap_or(Role::Member)),
            create_time: Set(now.into()),
            ..Default::default()
        };

        let created = model
            .insert(self.db)
            .await
            .map_err(|e| Error::on_insert("membership", e))?;

        tracing::info!(
            organization_id,
            user_id,
            role = ?created.role,
            "Added user to organization"
        );
        Ok(created)
    }

    /// Reassign the role of an existing membership.
    pub async fn assign_role(
        &self,
        user_id: i64,
        organization_id: i64,
        role: Role,
    ) -> Result<membership::Model, Error> {
        let membership = Membership::find()
            .filter(membership::Column::UserId.eq(user_id))
            .filter(membership::Column::OrganizationId.eq(organization_id))
            .one(self.db)
            .await?
            .ok_or_else(|| Error::not_found("membership"))?;

        let mut active = membership.into_active_model();
        active.role = Set(role);

        Ok(active.update(self.db).await?)
    }

    /// Whether a membership row exists for the pair.
    pub async fn membership_exists(
        &self,
        user_id: i64,
        organization_id: i64,
    ) -> Result<bool, Error> {
        Ok(find_membership(self.db, user_id, organization_id)
            .await?
            .is_some())
    }
}

/// Transaction-scoped membership lookup used by access key issuance, so the
/// precondition check and the key insert share one atomic unit. Takes a
/// shared row lock on Postgres; SQLite's writer lock covers the same race.
pub(crate) async fn find_membership<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    organization_id: i64,
) -> Result<Option<membership::Model>, DbErr> {
    let mut query = Membership::find()
        .filter(membership::Column::UserId.eq(user_id))
        .filter(membership::Column::OrganizationId.eq(organization_id));

    if conn.get_database_backend() == DatabaseBackend::Postgres {
        query = query.lock_shared();
    }

    query.one(conn).await
}
