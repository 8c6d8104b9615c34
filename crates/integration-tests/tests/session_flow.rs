//! Sign-in, persistence, and session teardown against a live fake service.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use emporium_core::{Email, ProductId};
use emporium_integration_tests::FakeShop;
use emporium_storefront::error::{ErrorKind, StorefrontError};
use emporium_storefront::gateway::GatewayEvent;
use emporium_storefront::navigation::Route;
use emporium_storefront::services::auth::{AuthError, Registration};
use secrecy::SecretString;

#[tokio::test]
async fn test_register_signs_in() {
    let shop = FakeShop::start().await;
    let dir = tempfile::tempdir().unwrap();
    let storefront = shop.storefront(dir.path());

    let user = storefront
        .auth()
        .register(Registration {
            email: "grace@example.com".to_string(),
            name: "  Grace Hopper ".to_string(),
            phone: Some(String::new()),
            password: SecretString::from("cobol1959"),
        })
        .await
        .unwrap();

    assert_eq!(user.name, "Grace Hopper");
    assert!(user.phone.is_none());
    assert!(storefront.session().is_authenticated());
    assert_eq!(
        storefront.session().user().unwrap().email,
        Email::parse("grace@example.com").unwrap()
    );
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let shop = FakeShop::start().await;
    shop.seed_user("grace@example.com", "Grace", "cobol1959");
    let dir = tempfile::tempdir().unwrap();
    let storefront = shop.storefront(dir.path());

    let err = storefront
        .auth()
        .register(Registration {
            email: "grace@example.com".to_string(),
            name: "Grace".to_string(),
            phone: None,
            password: SecretString::from("cobol1959"),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Registration(_)));
    let err = StorefrontError::from(err);
    assert_eq!(err.kind(), ErrorKind::Rejected);
    assert_eq!(err.user_message(), "Email already registered");
    assert!(!storefront.session().is_authenticated());
}

#[tokio::test]
async fn test_wrong_password_leaves_session_empty() {
    let shop = FakeShop::start().await;
    shop.seed_user("ada@example.com", "Ada", "hunter22");
    let dir = tempfile::tempdir().unwrap();
    let storefront = shop.storefront(dir.path());

    let err = storefront
        .auth()
        .login("ada@example.com", "wrong-password")
        .await
        .unwrap_err();

    let err = StorefrontError::from(err);
    assert_eq!(err.kind(), ErrorKind::Rejected);
    assert!(!storefront.session().is_authenticated());
}

#[tokio::test]
async fn test_session_and_cart_survive_restart() {
    let shop = FakeShop::start().await;
    shop.seed_user("ada@example.com", "Ada", "hunter22");
    let widget = shop.seed_product("Widget", 999, "tools", 10);
    let dir = tempfile::tempdir().unwrap();

    {
        let storefront = shop.storefront(dir.path());
        storefront
            .auth()
            .login("ada@example.com", "hunter22")
            .await
            .unwrap();
        storefront.cart().add_item(
            ProductId::new(widget),
            "Widget",
            "9.99".parse().unwrap(),
            2,
        );
    }

    let restarted = shop.storefront(dir.path());
    assert!(restarted.session().is_authenticated());
    assert_eq!(restarted.session().user().unwrap().name, "Ada");
    assert_eq!(restarted.cart().item_count(), 2);
    assert_eq!(restarted.cart().total(), "19.98".parse().unwrap());

    // The restored credential is still accepted.
    assert!(restarted.orders().mine().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_clears_persisted_session() {
    let shop = FakeShop::start().await;
    shop.seed_user("ada@example.com", "Ada", "hunter22");
    let dir = tempfile::tempdir().unwrap();

    {
        let storefront = shop.storefront(dir.path());
        storefront
            .auth()
            .login("ada@example.com", "hunter22")
            .await
            .unwrap();
        storefront.auth().logout();
    }

    let restarted = shop.storefront(dir.path());
    assert!(!restarted.session().is_authenticated());
}

#[tokio::test]
async fn test_revoked_token_tears_down_session_once() {
    let shop = FakeShop::start().await;
    shop.seed_user("ada@example.com", "Ada", "hunter22");
    let widget = shop.seed_product("Widget", 999, "tools", 10);
    let dir = tempfile::tempdir().unwrap();
    let storefront = shop.storefront(dir.path());

    let routes = Arc::new(Mutex::new(Vec::<Route>::new()));
    let seen = Arc::clone(&routes);
    let _hook = storefront.install_navigator(Arc::new(move |route: Route| {
        seen.lock().unwrap().push(route);
    }));
    let mut events = storefront.gateway().subscribe();

    storefront
        .auth()
        .login("ada@example.com", "hunter22")
        .await
        .unwrap();
    storefront
        .cart()
        .add_item(ProductId::new(widget), "Widget", "9.99".parse().unwrap(), 1);
    shop.revoke_tokens();

    let (history, order) = tokio::join!(
        storefront.orders().mine(),
        storefront.checkout().place_order()
    );

    let history = StorefrontError::from(history.unwrap_err());
    let order = StorefrontError::from(order.unwrap_err());
    assert_eq!(history.kind(), ErrorKind::AuthExpired);
    assert_eq!(order.kind(), ErrorKind::AuthExpired);

    assert!(!storefront.session().is_authenticated());
    assert_eq!(storefront.cart().item_count(), 1);
    assert!(shop.orders().is_empty());

    let event = events.recv().await.unwrap();
    assert!(matches!(event, GatewayEvent::AuthExpired { .. }));
    assert!(events.try_recv().is_err());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*routes.lock().unwrap(), vec![Route::Login]);

    let restarted = shop.storefront(dir.path());
    assert!(!restarted.session().is_authenticated());
}

#[tokio::test]
async fn test_every_request_carries_a_fresh_request_id() {
    let shop = FakeShop::start().await;
    shop.seed_product("Widget", 999, "tools", 10);
    let dir = tempfile::tempdir().unwrap();
    let storefront = shop.storefront(dir.path());

    storefront.catalog().products(None).await.unwrap();
    storefront.catalog().products(Some("tools")).await.unwrap();
    storefront.catalog().products(None).await.unwrap();

    let ids = shop.request_ids();
    assert_eq!(ids.len(), 3);
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_ne!(ids[0], ids[2]);
}
