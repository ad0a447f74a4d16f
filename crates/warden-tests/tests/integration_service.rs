// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Service Integration Tests
//!
//! End-to-end scenarios through [`AccessService`].

use std::sync::Arc;

use warden_config::{ConfigFormat, ConfigLoader, RevocationBackend};
use warden_core::{CredentialError, UserId, WardenError};
use warden_rbac::{RbacRepository, ADMIN_ROLE_ID, MODERATOR_ROLE_ID};
use warden_service::AccessService;

use warden_tests::common::{
    init_test_logging, temp_test_dir, ConfigFixtures, MockRbacRepository, RbacFixtures,
    ServiceFixtures, EDITOR_ROLE_ID,
};

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_scenario_revoke_access_keeps_refresh() {
    init_test_logging();
    let service = ServiceFixtures::memory().await;

    let pair = service.issue(UserId::new(42), "user42").unwrap();
    let claims = service.verify_access(&pair.access_token).await.unwrap();
    assert_eq!(claims.sub, UserId::new(42));

    service.revoke(&pair.access_token).await.unwrap();
    let err = service.verify_access(&pair.access_token).await.unwrap_err();
    assert!(matches!(
        err,
        WardenError::Credential(CredentialError::Blacklisted { .. })
    ));
    assert!(err.is_security_event());

    let refresh = service.verify_refresh(&pair.refresh_token).await.unwrap();
    assert_eq!(refresh.sub, UserId::new(42));
}

#[tokio::test]
async fn test_scenario_admin_has_wildcard() {
    let service = ServiceFixtures::memory().await;
    let user = UserId::new(7);

    service.assign_role(user, ADMIN_ROLE_ID).unwrap();
    assert!(service.is_admin(user));
    assert!(service.has_permission(user, "/anything", "DELETE"));
}

#[tokio::test]
async fn test_full_login_refresh_logout() {
    let service = ServiceFixtures::memory().await;
    let user = UserId::new(11);

    let login = service.issue(user, "kim").unwrap();
    assert_eq!(login.token_type, "Bearer");
    assert!(login.expires_in() > 0);

    let rotated = service.refresh(&login.refresh_token).await.unwrap();
    let context = service
        .authenticate(&format!("Bearer {}", rotated.access_token))
        .await
        .unwrap();
    assert_eq!(context.user_id, user);

    service.revoke(&rotated.access_token).await.unwrap();
    service.revoke(&rotated.refresh_token).await.unwrap();
    assert_eq!(service.session_count(), 0);

    assert!(service.refresh(&rotated.refresh_token).await.is_err());
    assert!(service
        .authenticate(&format!("Bearer {}", rotated.access_token))
        .await
        .is_err());
}

#[tokio::test]
async fn test_revoke_all_requires_new_login() {
    let service = ServiceFixtures::memory().await;
    let user = UserId::new(12);
    let pair = service.issue(user, "lee").unwrap();

    service.revoke_all_for_user(user);

    let err = service.refresh(&pair.refresh_token).await.unwrap_err();
    assert_eq!(err.error_code(), "SESSION_NOT_FOUND");

    let fresh = service.issue(user, "lee").unwrap();
    service.refresh(&fresh.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_authorize_follows_role_changes() {
    let service = ServiceFixtures::memory().await;
    let user = UserId::new(13);
    let pair = service.issue(user, "max").unwrap();
    let context = service
        .authenticate(&format!("bearer {}", pair.access_token))
        .await
        .unwrap();

    assert_eq!(
        service.authorize(&context, "/reports", "GET").unwrap_err().error_code(),
        "FORBIDDEN"
    );

    service.assign_role(user, ADMIN_ROLE_ID).unwrap();
    service.authorize(&context, "/reports", "GET").unwrap();

    service.remove_role(user, ADMIN_ROLE_ID).unwrap();
    assert!(service.authorize(&context, "/reports", "GET").is_err());
}

#[tokio::test]
async fn test_moderation_checks() {
    let service = ServiceFixtures::memory().await;
    let user = UserId::new(14);

    assert!(!service.can_moderate(user));
    service.assign_role(user, MODERATOR_ROLE_ID).unwrap();
    assert!(service.is_moderator(user));
    assert!(service.can_moderate(user));
    assert!(!service.is_admin(user));
    assert!(service.permissions_of(user).is_empty());
}

#[tokio::test]
async fn test_clear_permission_cache() {
    let service = ServiceFixtures::memory().await;
    let user = UserId::new(15);

    service.has_permission(user, "/x", "GET");
    assert_eq!(service.resolver().cached_users(), vec![user]);

    service.clear_permission_cache(user);
    assert!(service.resolver().cached_users().is_empty());
}

// =============================================================================
// Construction
// =============================================================================

#[tokio::test]
async fn test_built_from_yaml() {
    let yaml = r#"
issuer: api.example
access:
  secret: yaml-access-secret-yaml-access-secret
  ttl: 600
refresh:
  secret: yaml-refresh-secret-yaml-refresh-secret
  ttl: 86400
revocation:
  backend: memory
  max_entries: 1000
sweeper:
  interval: 30
"#;
    let config = ConfigLoader::new()
        .with_env_vars(false)
        .load_from_str(yaml, ConfigFormat::Yaml)
        .unwrap();
    let service = AccessService::from_config(config).await.unwrap();

    let pair = service.issue(UserId::new(1), "yaml").unwrap();
    let claims = service.verify_access(&pair.access_token).await.unwrap();
    assert_eq!(claims.iss, "api.example");
    assert_eq!(claims.exp - claims.iat, 600);
}

#[tokio::test]
async fn test_seeding_can_be_disabled() {
    let mut config = ConfigFixtures::default_config();
    config.rbac.seed_defaults = false;
    let service = AccessService::from_config(config).await.unwrap();

    let err = service.assign_role(UserId::new(1), ADMIN_ROLE_ID).unwrap_err();
    assert_eq!(err.error_code(), "ROLE_NOT_FOUND");
}

#[tokio::test]
async fn test_hybrid_without_store_is_rejected() {
    let err = AccessService::from_config(ConfigFixtures::with_backend(RevocationBackend::Hybrid))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CONFIG_ERROR");
}

#[tokio::test]
async fn test_repository_snapshot_is_loaded_and_saved() {
    let store = RbacFixtures::store();
    store.assign_role(UserId::new(21), EDITOR_ROLE_ID).unwrap();
    let repository = Arc::new(MockRbacRepository::with_snapshot(store.snapshot()));

    let service = AccessService::builder()
        .config(ConfigFixtures::default_config())
        .rbac_repository(repository.clone() as Arc<dyn RbacRepository>)
        .build()
        .await
        .unwrap();

    assert!(service.has_permission(UserId::new(21), "/posts", "PUT"));

    service.assign_role(UserId::new(22), ADMIN_ROLE_ID).unwrap();
    assert!(service.persist_rbac().await.unwrap());
    assert_eq!(repository.save_count(), 1);

    let stored = repository.stored().unwrap();
    assert!(stored
        .assignments
        .iter()
        .any(|a| a.user_id == UserId::new(22) && a.role_id == ADMIN_ROLE_ID));
}

#[tokio::test]
async fn test_repository_failure_aborts_build() {
    let repository = Arc::new(MockRbacRepository::new());
    repository.set_failing(true);

    let result = AccessService::builder()
        .config(ConfigFixtures::default_config())
        .rbac_repository(repository as Arc<dyn RbacRepository>)
        .build()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_snapshot_path_from_config() {
    let dir = temp_test_dir("warden-service");
    let mut config = ConfigFixtures::default_config();
    config.rbac.snapshot_path = Some(dir.path().join("rbac.json"));

    let first = AccessService::from_config(config.clone()).await.unwrap();
    first.assign_role(UserId::new(7), ADMIN_ROLE_ID).unwrap();
    first.persist_rbac().await.unwrap();
    drop(first);

    let second = AccessService::from_config(config).await.unwrap();
    assert!(second.is_admin(UserId::new(7)));
}

// =============================================================================
// Background Tasks
// =============================================================================

#[tokio::test]
async fn test_background_sweeper_lifecycle() {
    let service = ServiceFixtures::memory().await;

    assert!(service.start_background());
    assert!(service.is_background_running());

    service.shutdown().await;
    assert!(!service.is_background_running());

    // Stopping twice is harmless.
    service.shutdown().await;
}

#[tokio::test]
async fn test_sweep_now_keeps_live_entries() {
    let service = ServiceFixtures::memory().await;
    let pair = service.issue(UserId::new(30), "zed").unwrap();
    service.revoke(&pair.access_token).await.unwrap();

    assert_eq!(service.sweep_now(), 0);
    assert_eq!(service.session_count(), 1);
    assert!(service.verify_access(&pair.access_token).await.is_err());
}
