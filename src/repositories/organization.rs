//! # Organization Repository
//!
//! Creation with random-draw ids and the organization-side projections used
//! by the HTTP layer and batch scripts.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::server_time;
use crate::error::Error;
use crate::models::membership;
use crate::models::organization::{self, Entity as Organization};
use crate::models::user::{self, Entity as User};
use crate::repositories::{MAX_ID_DRAW_ATTEMPTS, Row, draw_account_id, project_columns};
use crate::validation::is_valid_account_name;

const DEFAULT_USER_COLUMNS: &[&str] = &["id", "username", "email"];

/// Request data for creating a new organization
#[derive(Debug, Clone)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub country_code: Option<String>,
    /// Currency of the running balance; defaults to USD.
    pub currency: Option<String>,
}

/// Repository for Organization database operations
pub struct OrganizationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> OrganizationRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new organization.
    ///
    /// The id is drawn at random and checked for collisions; duplicate names
    /// surface as [`Error::AlreadyExists`].
    pub async fn create(
        &self,
        request: CreateOrganizationRequest,
    ) -> Result<organization::Model, Error> {
        if !is_valid_account_name(&request.name) {
            return Err(Error::validation("invalid organization name"));
        }

        let id = self.draw_unused_id().await?;
        let now = server_time(self.db).await?;

        let model = organization::ActiveModel {
            id: Set(id),
            name: Set(request.name),
            country_code: Set(request.country_code),
            currency: Set(request.currency.unwrap_or_else(|| "USD".to_string())),
            create_time: Set(now.into()),
        };

        let created = model
            .insert(self.db)
            .await
            .map_err(|e| Error::on_insert("organization", e))?;

        tracing::info!(organization_id = created.id, "Created organization");
        Ok(created)
    }

    /// Get an organization by id.
    pub async fn get_by_id(
        &self,
        organization_id: i64,
    ) -> Result<Option<organization::Model>, Error> {
        Ok(Organization::find_by_id(organization_id).one(self.db).await?)
    }

    /// Look up an organization id by its unique name.
    pub async fn find_id_by_name(&self, name: &str) -> Result<Option<i64>, Error> {
        let found = Organization::find()
            .filter(organization::Column::Name.eq(name))
            .one(self.db)
            .await?;

        Ok(found.map(|org| org.id))
    }

    /// All users of an organization, projected to the requested columns
    /// (default: id, username, email). An organization with no members, or an
    /// unknown organization id, yields an empty result.
    pub async fn users_of_organization(
        &self,
        organization_id: i64,
        columns: Option<&[&str]>,
    ) -> Result<Vec<Row>, Error> {
        let columns = columns.unwrap_or(DEFAULT_USER_COLUMNS);

        let memberships = membership::Entity::find()
            .filter(membership::Column::OrganizationId.eq(organization_id))
            .all(self.db)
            .await?;

        if memberships.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<i64> = memberships.iter().map(|m| m.user_id).collect();
        let users = User::find()
            .filter(user::Column::Id.is_in(user_ids))
            .order_by_asc(user::Column::Id)
            .all(self.db)
            .await?;

        users
            .iter()
            .map(|user| project_columns(user, columns))
            .collect()
    }

    async fn draw_unused_id(&self) -> Result<i64, Error> {
        for _ in 0..MAX_ID_DRAW_ATTEMPTS {
            let candidate = draw_account_id();
            let taken = Organization::find_by_id(candidate)
                .one(self.db)
                .await?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
        }

        Err(Error::Internal(
            "exhausted random id draws for organization".to_string(),
        ))
    }
}
