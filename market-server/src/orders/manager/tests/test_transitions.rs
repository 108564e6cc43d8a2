use super::*;

#[tokio::test]
async fn test_seller_walks_order_to_delivered() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    for status in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let order = f.manager.transition("o1", to(status), &seller(1)).await.unwrap();
        assert_eq!(order.status, status);
    }

    let order = f.manager.get("o1", &buyer(1)).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.tracking_history.len(), 3);
    assert!(f.inventory.released.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_forward_move_may_skip_states() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    let order = f
        .manager
        .transition("o1", to(OrderStatus::Delivered), &seller(1))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_delivered_then_processing_is_illegal() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    f.manager
        .transition("o1", to(OrderStatus::Delivered), &seller(1))
        .await
        .unwrap();
    let err = f
        .manager
        .transition("o1", to(OrderStatus::Processing), &seller(1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::Transition(TransitionError::IllegalTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Processing,
        })
    ));
    let order = f.store.get_order("o1").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.tracking_history.len(), 1);
}

#[tokio::test]
async fn test_buyer_cannot_ship() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    let err = f
        .manager
        .transition("o1", to(OrderStatus::Shipped), &buyer(1))
        .await
        .unwrap_err();
    let app: AppError = err.into();
    assert_eq!(app.code, ErrorCode::PermissionDenied);
    assert_eq!(app.detail_str("redirect"), Some("/buyer"));
}

#[tokio::test]
async fn test_foreign_seller_is_unauthorized() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    let err = f
        .manager
        .transition("o1", to(OrderStatus::Processing), &seller(2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::Transition(TransitionError::Unauthorized {
            actor: Role::Seller,
            ..
        })
    ));
}

#[tokio::test]
async fn test_buyer_cancel_releases_inventory() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    let order = f
        .manager
        .transition("o1", to(OrderStatus::Cancelled), &buyer(1))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(*f.inventory.released.lock().unwrap(), vec!["o1".to_string()]);
}

#[tokio::test]
async fn test_buyer_cannot_cancel_after_shipping() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;
    f.manager
        .transition("o1", to(OrderStatus::Shipped), &seller(1))
        .await
        .unwrap();

    let err = f
        .manager
        .transition("o1", to(OrderStatus::Cancelled), &buyer(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::Transition(TransitionError::Unauthorized { .. })
    ));

    // seller and admin still can
    let order = f
        .manager
        .transition("o1", to(OrderStatus::Cancelled), &admin())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_release_failure_keeps_cancellation() {
    let f = fixture_with(
        RecordingInventory {
            fail: true,
            ..Default::default()
        },
        RecordingNotifier::default(),
    );
    seed_order(&f.store, "o1", 1).await;

    let order = f
        .manager
        .transition("o1", to(OrderStatus::Cancelled), &admin())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_shipping_records_tracking_details() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    let request = StatusChangeRequest {
        status: OrderStatus::Shipped,
        note: Some("Left the warehouse".into()),
        location: Some("Oakland".into()),
        tracking_number: Some("1Z999".into()),
        carrier: Some("UPS".into()),
    };
    f.manager.transition("o1", request, &seller(1)).await.unwrap();

    let tracking = f.manager.tracking("o1", &buyer(1)).await.unwrap();
    assert_eq!(tracking.status, OrderStatus::Shipped);
    assert_eq!(tracking.tracking_number.as_deref(), Some("1Z999"));
    assert_eq!(tracking.carrier.as_deref(), Some("UPS"));
    assert_eq!(tracking.history.len(), 1);
    assert_eq!(tracking.history[0].actor_role, Role::Seller);
    assert_eq!(tracking.history[0].location.as_deref(), Some("Oakland"));
}

#[tokio::test]
async fn test_tracking_number_ignored_outside_shipping() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    let request = StatusChangeRequest {
        tracking_number: Some("early".into()),
        ..to(OrderStatus::Processing)
    };
    let order = f.manager.transition("o1", request, &seller(1)).await.unwrap();
    assert_eq!(order.tracking_number, None);
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let f = fixture();
    let err = f
        .manager
        .transition("nope", to(OrderStatus::Processing), &seller(1))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotFound(id) if id == "nope"));
}

#[tokio::test]
async fn test_non_party_cannot_read_order() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    let err = f.manager.get("o1", &buyer(2)).await.unwrap_err();
    let app: AppError = err.into();
    assert_eq!(app.code, ErrorCode::NotOrderParty);

    assert!(f.manager.get("o1", &seller(1)).await.is_ok());
    assert!(f.manager.get("o1", &admin()).await.is_ok());
}

#[tokio::test]
async fn test_storage_outage_surfaces_as_retryable() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;
    f.store.set_offline(true);

    let err = f
        .manager
        .transition("o1", to(OrderStatus::Processing), &seller(1))
        .await
        .unwrap_err();
    let app: AppError = err.into();
    assert_eq!(app.code, ErrorCode::StorageUnavailable);
}

#[tokio::test]
async fn test_listing_is_scoped_per_role() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;
    seed_order(&f.store, "o2", 2).await;

    let page = f
        .manager
        .list(&buyer(1), &OrderQuery::default())
        .await
        .unwrap();
    let ids: Vec<_> = page.orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["o2", "o1"]);
    assert_eq!(page.pagination.total, 2);

    let page = f
        .manager
        .list(&buyer(2), &OrderQuery::default())
        .await
        .unwrap();
    assert!(page.orders.is_empty());

    let page = f
        .manager
        .list(&seller(2), &OrderQuery::default())
        .await
        .unwrap();
    assert!(page.orders.is_empty());

    let query = OrderQuery {
        status: Some(OrderStatus::Pending),
        limit: Some(1),
        ..Default::default()
    };
    let page = f.manager.list(&seller(1), &query).await.unwrap();
    assert_eq!(page.orders.len(), 1);
    assert_eq!(page.pagination.pages, 2);
}

#[tokio::test]
async fn test_every_transition_notifies_the_buyer() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    let request = StatusChangeRequest {
        note: Some("Packed".into()),
        ..to(OrderStatus::Processing)
    };
    f.manager.transition("o1", request, &seller(1)).await.unwrap();
    f.manager
        .transition("o1", to(OrderStatus::Cancelled), &buyer(1))
        .await
        .unwrap();

    let sent = f.notifier.sent.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec![
            ("B1".to_string(), "Order #o1 PROCESSING: Packed".to_string()),
            ("B1".to_string(), "Order #o1 CANCELLED".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_rejected_transition_sends_nothing() {
    let f = fixture();
    seed_order(&f.store, "o1", 1).await;

    f.manager
        .transition("o1", to(OrderStatus::Shipped), &buyer(1))
        .await
        .unwrap_err();
    assert!(f.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_notification_failure_keeps_status_change() {
    let f = fixture_with(
        RecordingInventory::default(),
        RecordingNotifier {
            fail: true,
            ..Default::default()
        },
    );
    seed_order(&f.store, "o1", 1).await;

    let order = f
        .manager
        .transition("o1", to(OrderStatus::Cancelled), &admin())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(*f.inventory.released.lock().unwrap(), vec!["o1".to_string()]);
}

#[tokio::test]
async fn test_store_notifier_writes_buyer_inbox() {
    let store = Arc::new(MemoryStore::new());
    let manager = OrdersManager::new(
        store.clone(),
        Arc::new(AggregateLocks::new()),
        Arc::new(RecordingInventory::default()),
        Arc::new(crate::orders::StoreNotifier::new(store.clone())),
    );
    seed_order(&store, "o1", 1).await;

    manager
        .transition("o1", to(OrderStatus::Shipped), &seller(1))
        .await
        .unwrap();

    let inbox = store.list_notifications("B1").await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, shared::models::NotificationKind::OrderUpdate);
    assert_eq!(inbox[0].message, "Order #o1 SHIPPED");
    assert_eq!(inbox[0].order_id.as_deref(), Some("o1"));
}
