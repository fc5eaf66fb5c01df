//! # User Repository
//!
//! User creation plus the user-side projections: profile and the
//! organizations a user belongs to, with the membership role exposed as a
//! selectable pseudo-column.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::server_time;
use crate::error::Error;
use crate::models::membership;
use crate::models::organization::{self, Entity as Organization};
use crate::models::user::{self, Entity as User};
use crate::repositories::{
    MAX_ID_DRAW_ATTEMPTS, Row, draw_account_id, project_columns, project_map, to_column_map,
};
use crate::validation::{is_valid_account_name, is_valid_email};

const DEFAULT_ORGANIZATION_COLUMNS: &[&str] = &["id", "name", "role"];
const PROFILE_COLUMNS: &[&str] = &["username", "email"];

/// Request data for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub social_profile: Option<String>,
}

/// Repository for User database operations
pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new user. Duplicate usernames or emails surface as
    /// [`Error::AlreadyExists`].
    pub async fn create(&self, request: CreateUserRequest) -> Result<user::Model, Error> {
        if !is_valid_account_name(&request.username) {
            return Err(Error::validation("invalid username"));
        }
        if !is_valid_email(&request.email) {
            return Err(Error::validation("invalid email"));
        }

        let id = self.draw_unused_id().await?;
        let now = server_time(self.db).await?;

        let model = user::ActiveModel {
            id: Set(id),
            username: Set(request.username),
            email: Set(request.email),
            company: Set(request.company),
            location: Set(request.location),
            social_profile: Set(request.social_profile),
            create_time: Set(now.into()),
        };

        let created = model
            .insert(self.db)
            .await
            .map_err(|e| Error::on_insert("user", e))?;

        tracing::info!(user_id = created.id, "Created user");
        Ok(created)
    }

    /// Get a user by id.
    pub async fn get_by_id(&self, user_id: i64) -> Result<Option<user::Model>, Error> {
        Ok(User::find_by_id(user_id).one(self.db).await?)
    }

    /// Username and email of a user, or None for an unknown id.
    pub async fn profile(&self, user_id: i64) -> Result<Option<Row>, Error> {
        let Some(user) = User::find_by_id(user_id).one(self.db).await? else {
            return Ok(None);
        };

        Ok(Some(project_columns(&user, PROFILE_COLUMNS)?))
    }

    /// Organizations the user belongs to, projected to the requested columns
    /// (default: id, name, role). `role` comes from the membership row; every
    /// other column is an organization column.
    pub async fn organizations_of_user(
        &self,
        user_id: i64,
        columns: Option<&[&str]>,
    ) -> Result<Vec<Row>, Error> {
        let columns = columns.unwrap_or(DEFAULT_ORGANIZATION_COLUMNS);

        let memberships = membership::Entity::find()
            .filter(membership::Column::UserId.eq(user_id))
            .order_by_asc(membership::Column::Id)
            .all(self.db)
            .await?;

        if memberships.is_empty() {
            return Ok(Vec::new());
        }

        let organization_ids: Vec<i64> = memberships.iter().map(|m| m.organization_id).collect();
        let organizations: HashMap<i64, organization::Model> = Organization::find()
            .filter(organization::Column::Id.is_in(organization_ids))
            .all(self.db)
            .await?
            .into_iter()
            .map(|org| (org.id, org))
            .collect();

        let mut rows = Vec::with_capacity(memberships.len());
        for m in &memberships {
            let Some(org) = organizations.get(&m.organization_id) else {
                continue;
            };

            let mut full = to_column_map(org)?;
            full.insert(
                "role".to_string(),
                serde_json::to_value(m.role)
                    .map_err(|e| Error::Internal(format!("failed to serialize role: {e}")))?,
            );
            rows.push(project_map(&full, columns)?);
        }

        Ok(rows)
    }

    async fn draw_unused_id(&self) -> Result<i64, Error> {
        for _ in 0..MAX_ID_DRAW_ATTEMPTS {
            let candidate = draw_account_id();
            let taken = User::find_by_id(candidate).one(self.db).await?.is_some();
            if !taken {
                return Ok(candidate);
            }
        }

        Err(Error::Internal(
            "exhausted random id draws for user".to_string(),
        ))
    }
}
