//! Integration tests for account management and the query-layer projections.

mod test_utils;

use billing::error::Error;
use billing::models::{Role, membership};
use billing::repositories::{
    CreateOrganizationRequest, CreateUserRequest, MembershipRepository, OrganizationRepository,
    UserRepository,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use test_utils::{add_member, create_test_organization, create_test_user, setup_test_db};

#[tokio::test]
async fn create_organization_assigns_an_opaque_id() {
    let db = setup_test_db().await.unwrap();
    let org = create_test_organization(&db, "Test-Organization").await.unwrap();

    assert_eq!(org.name, "Test-Organization");
    assert_eq!(org.country_code.as_deref(), Some("US"));
    assert_eq!(org.currency, "USD");
    assert!((10_000_000_000..=99_999_999_999).contains(&org.id));

    let repo = OrganizationRepository::new(&db);
    let fetched = repo.get_by_id(org.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, org.name);
    assert!(repo.get_by_id(123).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_organization_name_is_a_conflict() {
    let db = setup_test_db().await.unwrap();
    create_test_organization(&db, "Duplicate-Organization")
        .await
        .unwrap();

    let repo = OrganizationRepository::new(&db);
    let result = repo
        .create(CreateOrganizationRequest {
            name: "Duplicate-Organization".to_string(),
            country_code: None,
            currency: None,
        })
        .await;

    assert!(matches!(result, Err(Error::AlreadyExists { .. })));
}

#[tokio::test]
async fn invalid_organization_name_is_rejected() {
    let db = setup_test_db().await.unwrap();
    let repo = OrganizationRepository::new(&db);

    for name in ["", "a", "-leading", "trailing-", "has spaces", "bad!char"] {
        let result = repo
            .create(CreateOrganizationRequest {
                name: name.to_string(),
                country_code: None,
                currency: None,
            })
            .await;
        assert!(
            matches!(result, Err(Error::Validation(_))),
            "name {name:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn organization_id_lookup_by_name() {
    let db = setup_test_db().await.unwrap();
    let org = create_test_organization(&db, "Test-Organization").await.unwrap();

    let repo = OrganizationRepository::new(&db);
    assert_eq!(
        repo.find_id_by_name("Test-Organization").await.unwrap(),
        Some(org.id)
    );
    assert_eq!(repo.find_id_by_name("Nonexistent-Org").await.unwrap(), None);
}

#[tokio::test]
async fn create_user_validates_and_stores_optional_fields() {
    let db = setup_test_db().await.unwrap();
    let repo = UserRepository::new(&db);

    let user = repo
        .create(CreateUserRequest {
            username: "testuser".to_string(),
            email: "testuser@example.com".to_string(),
            company: Some("Test Company".to_string()),
            location: Some("Test City".to_string()),
            social_profile: Some("https://example.com/testuser".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(user.username, "testuser");
    assert_eq!(user.email, "testuser@example.com");
    assert_eq!(user.company.as_deref(), Some("Test Company"));
    assert!((10_000_000_000..=99_999_999_999).contains(&user.id));

    let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(fetched.email, user.email);
    assert!(repo.get_by_id(123).await.unwrap().is_none());

    let result = repo
        .create(CreateUserRequest {
            username: "testuser".to_string(),
            email: "other@example.com".to_string(),
            company: None,
            location: None,
            social_profile: None,
        })
        .await;
    assert!(matches!(result, Err(Error::AlreadyExists { .. })));

    let result = repo
        .create(CreateUserRequest {
            username: "otheruser".to_string(),
            email: "testuser@example.com".to_string(),
            company: None,
            location: None,
            social_profile: None,
        })
        .await;
    assert!(matches!(result, Err(Error::AlreadyExists { .. })));

    let result = repo
        .create(CreateUserRequest {
            username: "bad name".to_string(),
            email: "ok@example.com".to_string(),
            company: None,
            location: None,
            social_profile: None,
        })
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let result = repo
        .create(CreateUserRequest {
            username: "okname".to_string(),
            email: "not-an-email".to_string(),
            company: None,
            location: None,
            social_profile: None,
        })
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn membership_creation_and_roles() {
    let db = setup_test_db().await.unwrap();
    let org = create_test_organization(&db, "Test-Organization").await.unwrap();
    let user = create_test_user(&db, "testuser", "testuser@example.com")
        .await
        .unwrap();

    let repo = MembershipRepository::new(&db);

    let created = repo
        .add_user_to_organization(user.id, org.id, None)
        .await
        .unwrap();
    assert_eq!(created.role, Role::Member);
    assert!(repo.membership_exists(user.id, org.id).await.unwrap());

    // The pair is unique.
    let result = repo.add_user_to_organization(user.id, org.id, None).await;
    assert!(matches!(result, Err(Error::AlreadyExists { .. })));

    // Missing sides are NotFound, not booleans.
    let result = repo.add_user_to_organization(999, org.id, None).await;
    assert!(matches!(result, Err(Error::NotFound { .. })));
    let result = repo.add_user_to_organization(user.id, 999, None).await;
    assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn owner_role_can_be_assigned_at_creation_or_later() {
    let db = setup_test_db().await.unwrap();
    let org = create_test_organization(&db, "Test-Organization").await.unwrap();
    let user1 = create_test_user(&db, "testuser1", "testuser1@example.com")
        .await
        .unwrap();
    let user2 = create_test_user(&db, "testuser2", "testuser2@example.com")
        .await
        .unwrap();

    let repo = MembershipRepository::new(&db);

    let created = repo
        .add_user_to_organization(user1.id, org.id, Some(Role::Owner))
        .await
        .unwrap();
    assert_eq!(created.role, Role::Owner);

    repo.add_user_to_organization(user2.id, org.id, None)
        .await
        .unwrap();
    let updated = repo.assign_role(user2.id, org.id, Role::Owner).await.unwrap();
    assert_eq!(updated.role, Role::Owner);

    let stored = membership::Entity::find()
        .filter(membership::Column::UserId.eq(user2.id))
        .filter(membership::Column::OrganizationId.eq(org.id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.role, Role::Owner);

    let result = repo.assign_role(999, org.id, Role::Owner).await;
    assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn users_of_organization_projects_requested_columns() {
    let db = setup_test_db().await.unwrap();
    let org = create_test_organization(&db, "Test-Organization").await.unwrap();
    let user1 = create_test_user(&db, "testuser1", "testuser1@example.com")
        .await
        .unwrap();
    let user2 = create_test_user(&db, "testuser2", "testuser2@example.com")
        .await
        .unwrap();
    add_member(&db, user1.id, org.id).await.unwrap();
    add_member(&db, user2.id, org.id).await.unwrap();

    let repo = OrganizationRepository::new(&db);

    let users = repo.users_of_organization(org.id, None).await.unwrap();
    assert_eq!(users.len(), 2);
    for row in &users {
        assert_eq!(row.len(), 3);
        assert!(row.contains_key("id"));
        assert!(row.contains_key("username"));
        assert!(row.contains_key("email"));
    }
    assert!(users.iter().any(|row| row["username"] == "testuser1"));
    assert!(users.iter().any(|row| row["username"] == "testuser2"));

    let users = repo
        .users_of_organization(org.id, Some(&["id", "location", "company"]))
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
    for row in &users {
        assert_eq!(
            row.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["id", "location", "company"]
        );
    }

    // Unknown organizations yield empty results, not errors.
    let users = repo.users_of_organization(999, None).await.unwrap();
    assert!(users.is_empty());

    // Unknown columns are a validation error.
    let result = repo
        .users_of_organization(org.id, Some(&["id", "password"]))
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn organizations_of_user_includes_the_membership_role() {
    let db = setup_test_db().await.unwrap();
    let org1 = create_test_organization(&db, "Test-Organization1").await.unwrap();
    let org2 = create_test_organization(&db, "Test-Organization2").await.unwrap();
    let user = create_test_user(&db, "testuser", "testuser@example.com")
        .await
        .unwrap();

    let memberships = MembershipRepository::new(&db);
    memberships
        .add_user_to_organization(user.id, org1.id, Some(Role::Owner))
        .await
        .unwrap();
    memberships
        .add_user_to_organization(user.id, org2.id, Some(Role::Member))
        .await
        .unwrap();

    let repo = UserRepository::new(&db);

    let organizations = repo.organizations_of_user(user.id, None).await.unwrap();
    assert_eq!(organizations.len(), 2);

    let org1_row = organizations
        .iter()
        .find(|row| row["id"] == org1.id)
        .unwrap();
    assert_eq!(org1_row["name"], "Test-Organization1");
    assert_eq!(org1_row["role"], "owner");

    let org2_row = organizations
        .iter()
        .find(|row| row["id"] == org2.id)
        .unwrap();
    assert_eq!(org2_row["role"], "member");

    let organizations = repo
        .organizations_of_user(user.id, Some(&["id", "name", "country_code"]))
        .await
        .unwrap();
    assert_eq!(organizations.len(), 2);
    for row in &organizations {
        assert_eq!(
            row.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["id", "name", "country_code"]
        );
    }

    let organizations = repo.organizations_of_user(999, None).await.unwrap();
    assert!(organizations.is_empty());
}

#[tokio::test]
async fn user_profile_projection() {
    let db = setup_test_db().await.unwrap();
    let user = create_test_user(&db, "testuser", "testuser@example.com")
        .await
        .unwrap();

    let repo = UserRepository::new(&db);

    let profile = repo.profile(user.id).await.unwrap().unwrap();
    assert_eq!(profile["username"], "testuser");
    assert_eq!(profile["email"], "testuser@example.com");
    assert_eq!(profile.len(), 2);

    assert!(repo.profile(999).await.unwrap().is_none());
}
