//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for the billing entities. Each repository takes an explicit
//! store handle; nothing here holds global connection state.
//!
//! The query-layer projections share one contract: given a column list,
//! return matching rows as ordered `column -> value` mappings. An unknown
//! column is a validation error; no match is an empty result, never an error.

pub mod access_key;
pub mod ledger;
pub mod membership;
pub mod organization;
pub mod user;

pub use access_key::AccessKeyRepository;
pub use ledger::{LedgerRepository, NewTransaction};
pub use membership::MembershipRepository;
pub use organization::{CreateOrganizationRequest, OrganizationRepository};
pub use user::{CreateUserRequest, UserRepository};

use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;

/// A projected row: requested columns in request order.
pub type Row = Map<String, Value>;

/// Account ids (organizations and users) are uniform random draws from this
/// range, so an id reveals nothing about creation order or row counts.
pub(crate) const ACCOUNT_ID_MIN: i64 = 10_000_000_000;
pub(crate) const ACCOUNT_ID_MAX: i64 = 99_999_999_999;

/// Collision retries before giving up on an id draw. At the id-space size a
/// single retry is already unlikely; exhausting the cap means something else
/// is broken.
pub(crate) const MAX_ID_DRAW_ATTEMPTS: u32 = 16;

pub(crate) fn draw_account_id() -> i64 {
    rand::thread_rng().gen_range(ACCOUNT_ID_MIN..=ACCOUNT_ID_MAX)
}

pub(crate) fn to_column_map<T: Serialize>(model: &T) -> Result<Map<String, Value>, Error> {
    match serde_json::to_value(model) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::Internal(
            "row did not serialize to an object".to_string(),
        )),
        Err(e) => Err(Error::Internal(format!("failed to serialize row: {e}"))),
    }
}

pub(crate) fn project_map(map: &Map<String, Value>, columns: &[&str]) -> Result<Row, Error> {
    let mut row = Row::new();
    for &column in columns {
        let value = map
            .get(column)
            .ok_or_else(|| Error::validation(format!("unknown column: {column}")))?;
        row.insert(column.to_string(), value.clone());
    }
    Ok(row)
}

pub(crate) fn project_columns<T: Serialize>(model: &T, columns: &[&str]) -> Result<Row, Error> {
    let map = to_column_map(model)?;
    project_map(&map, columns)
}
