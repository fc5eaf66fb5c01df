//! # Access Key Repository
//!
//! Issuance, revocation and the revocation-window queries. Only the key hash
//! and thumbnail are persisted; the secret value leaves this module exactly
//! once, in the issuance result. Secrets never appear in logs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::db::server_time;
use crate::error::Error;
use crate::keys::{KeyCodec, KeySecret, hash_key, thumbnail};
use crate::models::access_key::{self, Entity as AccessKey};
use crate::repositories::membership::find_membership;
use crate::repositories::{Row, project_columns};

const DEFAULT_KEY_COLUMNS: &[&str] = &["id", "thumbnail", "create_time"];

/// Repository for access key lifecycle operations
pub struct AccessKeyRepository<'a> {
    db: &'a DatabaseConnection,
    codec: &'a KeyCodec,
}

impl<'a> AccessKeyRepository<'a> {
    pub fn new(db: &'a DatabaseConnection, codec: &'a KeyCodec) -> Self {
        Self { db, codec }
    }

    /// Issue a new key for a (user, organization) pair.
    ///
    /// The membership precondition is checked inside the same transaction as
    /// the insert, so a concurrently removed membership cannot slip a key
    /// through. Returns the persisted record and the one-time secret.
    pub async fn issue(
        &self,
        user_id: i64,
        organization_id: i64,
        name: Option<String>,
    ) -> Result<(access_key::Model, KeySecret), Error> {
        let txn = self.db.begin().await?;

        if find_membership(&txn, user_id, organization_id)
            .await?
            .is_none()
        {
            txn.rollback().await?;
            return Err(Error::precondition(format!(
                "user {user_id} is not a member of organization {organization_id}"
            )));
        }

        let secret = self.codec.generate(organization_id)?;
        let now = server_time(&txn).await?;

        let model = access_key::ActiveModel {
            name: Set(name),
            key_hash: Set(hash_key(secret.as_str())),
            thumbnail: Set(thumbnail(secret.as_str())),
            create_time: Set(now.into()),
            revoke_time: Set(None),
            user_id: Set(user_id),
            organization_id: Set(organization_id),
            ..Default::default()
        };

        let created = model.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            key_id = created.id,
            organization_id,
            user_id,
            key_hash = %created.key_hash,
            "Issued access key"
        );
        Ok((created, secret))
    }

    /// Revoke a key by id.
    ///
    /// Unknown ids fail with [`Error::NotFound`]; a key that is already
    /// revoked fails with [`Error::PreconditionFailed`] rather than silently
    /// moving its revocation time.
    pub async fn revoke(&self, key_id: i64) -> Result<(), Error> {
        let txn = self.db.begin().await?;

        let mut query = AccessKey::find_by_id(key_id);
        if txn.get_database_backend() == DatabaseBackend::Postgres {
            query = query.lock_exclusive();
        }

        let key = query
            .one(&txn)
            .await?
            .ok_or_else(|| Error::not_found("access key"))?;

        if key.revoke_time.is_some() {
            return Err(Error::precondition("access key already revoked"));
        }

        let now = server_time(&txn).await?;
        let key_hash = key.key_hash.clone();

        let mut active = key.into_active_model();
        active.revoke_time = Set(Some(now.into()));
        active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(key_id, key_hash = %key_hash, "Revoked access key");
        Ok(())
    }

    /// All non-revoked keys of an organization.
    pub async fn list_valid(&self, organization_id: i64) -> Result<Vec<access_key::Model>, Error> {
        Ok(AccessKey::find()
            .filter(access_key::Column::OrganizationId.eq(organization_id))
            .filter(access_key::Column::RevokeTime.is_null())
            .order_by_asc(access_key::Column::Id)
            .all(self.db)
            .await?)
    }

    /// Hashes of keys revoked within `[start, end)`.
    ///
    /// The half-open interval lets sweepers poll with adjacent windows and
    /// see every revocation exactly once.
    pub async fn revoked_hashes_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, Error> {
        let start: DateTimeWithTimeZone = start.into();
        let end: DateTimeWithTimeZone = end.into();

        let keys = AccessKey::find()
            .filter(access_key::Column::RevokeTime.gte(start))
            .filter(access_key::Column::RevokeTime.lt(end))
            .order_by_asc(access_key::Column::Id)
            .all(self.db)
            .await?;

        Ok(keys.into_iter().map(|key| key.key_hash).collect())
    }

    /// A user's non-revoked keys across the given organizations, grouped by
    /// organization and projected to the requested columns (default: id,
    /// thumbnail, create_time).
    pub async fn user_keys_in_organizations(
        &self,
        user_id: i64,
        organization_ids: &[i64],
        columns: Option<&[&str]>,
    ) -> Result<HashMap<i64, Vec<Row>>, Error> {
        let columns = columns.unwrap_or(DEFAULT_KEY_COLUMNS);

        let keys = AccessKey::find()
            .filter(access_key::Column::UserId.eq(user_id))
            .filter(access_key::Column::OrganizationId.is_in(organization_ids.iter().copied()))
            .filter(access_key::Column::RevokeTime.is_null())
            .order_by_asc(access_key::Column::Id)
            .all(self.db)
            .await?;

        let mut grouped: HashMap<i64, Vec<Row>> = organization_ids
            .iter()
            .map(|&org_id| (org_id, Vec::new()))
            .collect();

        for key in &keys {
            if let Some(bucket) = grouped.get_mut(&key.organization_id) {
                bucket.push(project_columns(key, columns)?);
            }
        }

        Ok(grouped)
    }
}
