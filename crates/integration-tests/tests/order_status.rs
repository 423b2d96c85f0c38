//! Order status changes against in-memory backends.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use audie_boutique_admin::services::{OrderStatusService, StatusUpdateError};
use audie_boutique_core::ports::StoreError;
use audie_boutique_core::{
    Locale, OrderStatus, StatusChange, TransitionError, TransitionPolicy, UserRole,
};
use audie_boutique_integration_tests::{MemoryBackend, Operation, at, order, user};

fn service(backend: &Arc<MemoryBackend>, locale: Locale) -> OrderStatusService {
    OrderStatusService::new(
        backend.clone(),
        backend.clone(),
        TransitionPolicy::default(),
        locale,
        Url::parse("https://audieboutique.com/").unwrap(),
    )
}

#[tokio::test]
async fn test_change_persists_and_notifies_once() {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    let mut stored = order(customer.id, OrderStatus::Pending, at(2024, 3, 1, 10), "42");
    backend.add_order(stored.clone()).await;

    let change = service(&backend, Locale::Fr)
        .apply_status(&mut stored, OrderStatus::Processing)
        .await
        .unwrap();

    assert_eq!(
        change,
        StatusChange::Changed {
            from: OrderStatus::Pending,
            to: OrderStatus::Processing
        }
    );
    assert_eq!(stored.status, OrderStatus::Processing);
    assert_eq!(
        backend.stored_order(stored.id).await.unwrap().status,
        OrderStatus::Processing
    );

    let pushes = backend.wait_for_pushes(1).await;
    assert_eq!(pushes.len(), 1);
    let (recipient, message) = &pushes[0];
    assert_eq!(*recipient, customer.id);
    assert_eq!(message.title, format!("Commande {}", stored.reference()));
    assert!(message.body.contains("Payée"));
    assert_eq!(
        message.url,
        format!("https://audieboutique.com/orders/{}", stored.id)
    );
}

#[tokio::test]
async fn test_english_notification() {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Jane Doe", "jane@example.com");
    let mut stored = order(customer.id, OrderStatus::Processing, at(2024, 3, 1, 10), "42");
    backend.add_order(stored.clone()).await;

    service(&backend, Locale::En)
        .apply_status(&mut stored, OrderStatus::Shipped)
        .await
        .unwrap();

    let pushes = backend.wait_for_pushes(1).await;
    assert_eq!(pushes[0].1.title, format!("Order {}", stored.reference()));
    assert_eq!(pushes[0].1.body, "Your order is now: Shipped");
}

#[tokio::test]
async fn test_same_status_is_noop() {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    let mut stored = order(customer.id, OrderStatus::Shipped, at(2024, 3, 1, 10), "42");
    backend.add_order(stored.clone()).await;

    let change = service(&backend, Locale::Fr)
        .apply_status(&mut stored, OrderStatus::Shipped)
        .await
        .unwrap();

    assert_eq!(
        change,
        StatusChange::Unchanged {
            status: OrderStatus::Shipped
        }
    );
    assert_eq!(backend.status_writes().await, 0);
    assert!(backend.pushes().await.is_empty());
}

#[tokio::test]
async fn test_persistence_failure_restores_status() {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    let mut stored = order(customer.id, OrderStatus::Processing, at(2024, 3, 1, 10), "42");
    backend.add_order(stored.clone()).await;
    backend.fail(Operation::UpdateStatus, StoreError::Timeout).await;

    let err = service(&backend, Locale::Fr)
        .apply_status(&mut stored, OrderStatus::Shipped)
        .await
        .unwrap_err();

    assert!(matches!(err, StatusUpdateError::Store(StoreError::Timeout)));
    assert_eq!(stored.status, OrderStatus::Processing);
    assert_eq!(
        backend.stored_order(stored.id).await.unwrap().status,
        OrderStatus::Processing
    );
    assert!(backend.pushes().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_change_is_a_conflict() {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    let mut stale = order(customer.id, OrderStatus::Pending, at(2024, 3, 1, 10), "42");
    backend.add_order(stale.clone()).await;
    backend.overwrite_status(stale.id, OrderStatus::Cancelled).await;

    let err = service(&backend, Locale::Fr)
        .apply_status(&mut stale, OrderStatus::Processing)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StatusUpdateError::Store(StoreError::Conflict {
            expected: OrderStatus::Pending,
            actual: OrderStatus::Cancelled,
        })
    ));
    assert_eq!(stale.status, OrderStatus::Pending);
    assert_eq!(
        backend.stored_order(stale.id).await.unwrap().status,
        OrderStatus::Cancelled
    );
}

#[tokio::test]
async fn test_notification_failure_keeps_change() {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    let mut stored = order(customer.id, OrderStatus::Shipped, at(2024, 3, 1, 10), "42");
    backend.add_order(stored.clone()).await;
    backend
        .fail(Operation::SendPush, StoreError::Backend("push service down".into()))
        .await;

    let change = service(&backend, Locale::Fr)
        .apply_status(&mut stored, OrderStatus::Delivered)
        .await
        .unwrap();

    assert!(matches!(change, StatusChange::Changed { .. }));
    assert_eq!(
        backend.stored_order(stored.id).await.unwrap().status,
        OrderStatus::Delivered
    );
}

#[tokio::test]
async fn test_illegal_transition_is_rejected() {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    let mut stored = order(customer.id, OrderStatus::Delivered, at(2024, 3, 1, 10), "42");
    backend.add_order(stored.clone()).await;

    let err = service(&backend, Locale::Fr)
        .apply_status(&mut stored, OrderStatus::Pending)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StatusUpdateError::Transition(TransitionError::NotAllowed {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        })
    ));
    assert_eq!(backend.status_writes().await, 0);
    assert!(backend.pushes().await.is_empty());
}

#[tokio::test]
async fn test_update_loads_order_by_id() {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    let stored = order(customer.id, OrderStatus::Pending, at(2024, 3, 1, 10), "42");
    backend.add_order(stored.clone()).await;

    let (updated, _) = service(&backend, Locale::Fr)
        .update(stored.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(updated.id, stored.id);
    assert_eq!(updated.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_slow_notification_does_not_delay_change() {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    let mut stored = order(customer.id, OrderStatus::Processing, at(2024, 3, 1, 10), "42");
    backend.add_order(stored.clone()).await;
    backend.slow_pushes(Duration::from_secs(30)).await;

    let change = tokio::time::timeout(
        Duration::from_secs(1),
        service(&backend, Locale::Fr).apply_status(&mut stored, OrderStatus::Shipped),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(matches!(change, StatusChange::Changed { .. }));
    assert_eq!(
        backend.stored_order(stored.id).await.unwrap().status,
        OrderStatus::Shipped
    );
    assert!(backend.pushes().await.is_empty());
}
