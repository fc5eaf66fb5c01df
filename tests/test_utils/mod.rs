//! Test utilities for database testing.
//!
//! Sets up in-memory SQLite databases with migrations applied, plus fixture
//! helpers for the account entities the suites share.

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use billing::keys::KeyCodec;
use billing::models::{membership, organization, user};
use billing::repositories::{
    CreateOrganizationRequest, CreateUserRequest, MembershipRepository, OrganizationRepository,
    UserRepository,
};

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is pinned to one connection; a pooled in-memory SQLite would
/// otherwise give every connection its own empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);
    let db = Database::connect(opt).await?;

    Migrator::up(&db, None).await?;

    // SQLite does not enforce our Postgres foreign key semantics; disable FK
    // checks so fixture rows do not need the full entity graph.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Codec with a fixed signing secret for issuance tests.
#[allow(dead_code)]
pub fn test_codec() -> KeyCodec {
    KeyCodec::new(b"integration-test-signing-secret")
}

/// Creates an organization through the repository (validated name, random id).
#[allow(dead_code)]
pub async fn create_test_organization(
    db: &DatabaseConnection,
    name: &str,
) -> Result<organization::Model> {
    let repo = OrganizationRepository::new(db);
    let org = repo
        .create(CreateOrganizationRequest {
            name: name.to_string(),
            country_code: Some("US".to_string()),
            currency: None,
        })
        .await?;
    Ok(org)
}

/// Creates a user through the repository.
#[allow(dead_code)]
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
) -> Result<user::Model> {
    let repo = UserRepository::new(db);
    let user = repo
        .create(CreateUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            company: None,
            location: None,
            social_profile: None,
        })
        .await?;
    Ok(user)
}

/// Adds a membership with the default role.
#[allow(dead_code)]
pub async fn add_member(
    db: &DatabaseConnection,
    user_id: i64,
    organization_id: i64,
) -> Result<membership::Model> {
    let repo = MembershipRepository::new(db);
    let membership = repo
        .add_user_to_organization(user_id, organization_id, None)
        .await?;
    Ok(membership)
}
