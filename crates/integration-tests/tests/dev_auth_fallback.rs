//! Development sign-in when the login endpoint is not deployed.

#![cfg(feature = "dev-auth-fallback")]
#![allow(clippy::unwrap_used)]

use emporium_integration_tests::FakeShop;
use emporium_storefront::Storefront;
use emporium_storefront::services::auth::AuthError;

#[tokio::test]
async fn test_fallback_signs_in_by_email() {
    let shop = FakeShop::start().await;
    let id = shop.seed_user("ada@example.com", "Ada", "hunter22");
    shop.disable_login();
    let dir = tempfile::tempdir().unwrap();
    let storefront =
        Storefront::new(shop.config(dir.path()).with_dev_auth_fallback(true)).unwrap();

    let user = storefront
        .auth()
        .login("ada@example.com", "anything")
        .await
        .unwrap();

    assert_eq!(user.id.as_i64(), id);
    let credential = storefront.session().credential().unwrap();
    assert!(credential.expose().starts_with(&format!("dev-{id}-")));
}

#[tokio::test]
async fn test_fallback_is_off_unless_enabled() {
    let shop = FakeShop::start().await;
    shop.seed_user("ada@example.com", "Ada", "hunter22");
    shop.disable_login();
    let dir = tempfile::tempdir().unwrap();
    let storefront = shop.storefront(dir.path());

    let err = storefront
        .auth()
        .login("ada@example.com", "hunter22")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Login(_)));
    assert!(!storefront.session().is_authenticated());
}

#[tokio::test]
async fn test_fallback_unknown_email_fails() {
    let shop = FakeShop::start().await;
    shop.disable_login();
    let dir = tempfile::tempdir().unwrap();
    let storefront =
        Storefront::new(shop.config(dir.path()).with_dev_auth_fallback(true)).unwrap();

    let err = storefront
        .auth()
        .login("nobody@example.com", "hunter22")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Login(_)));
    assert!(!storefront.session().is_authenticated());
}

#[tokio::test]
async fn test_dev_credential_is_rejected_by_protected_endpoints() {
    let shop = FakeShop::start().await;
    shop.seed_user("ada@example.com", "Ada", "hunter22");
    shop.disable_login();
    let dir = tempfile::tempdir().unwrap();
    let storefront =
        Storefront::new(shop.config(dir.path()).with_dev_auth_fallback(true)).unwrap();
    storefront
        .auth()
        .login("ada@example.com", "hunter22")
        .await
        .unwrap();

    assert!(storefront.orders().mine().await.is_err());
    assert!(!storefront.session().is_authenticated());
}
