//! Out-of-order responses and responses for disposed controllers.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use mapfood_core::ShopStatus;
use mapfood_dashboard::api::RevenuePeriod;
use mapfood_dashboard::controllers::{RevenueController, ShopsController};
use mapfood_dashboard::{FetchError, FetchOutcome, MemoryNotifier};
use mapfood_integration_tests::fixtures::{revenue, shop};
use mapfood_integration_tests::{MockBackend, owner};

fn pho_shops() -> MockBackend {
    MockBackend::new().with_shops([
        shop("s1", "Pho Hoa", "ACTIVE"),
        shop("s2", "Pho 24", "INACTIVE"),
        shop("s3", "Banh Mi 37", "ACTIVE"),
    ])
}

#[tokio::test]
async fn test_late_response_does_not_overwrite_newer_query() {
    let api = Arc::new(pho_shops());
    let notifier = Arc::new(MemoryNotifier::new());
    let controller = Arc::new(ShopsController::new(api.clone(), notifier.clone()));
    controller.listing().load().await.unwrap();

    // Q1: search "pho", held at the backend.
    let mut hold = api.hold("list_shops");
    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.listing().set_search("pho").await }
    });
    hold.arrived().await;

    // Q2: only active pho shops; answers straight away.
    let second = controller.filter_by_status(Some(ShopStatus::Active)).await.unwrap();
    assert!(second.is_applied());

    hold.release();
    assert_eq!(first.await.unwrap().unwrap(), FetchOutcome::Superseded);

    let names: Vec<String> = controller
        .listing()
        .items()
        .await
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Pho Hoa"]);
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn test_late_failure_is_dropped_silently() {
    let api = Arc::new(pho_shops());
    let notifier = Arc::new(MemoryNotifier::new());
    let controller = Arc::new(ShopsController::new(api.clone(), notifier.clone()));
    controller.listing().load().await.unwrap();

    let mut hold = api.hold("list_shops");
    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.listing().set_search("pho").await }
    });
    hold.arrived().await;
    controller.listing().set_search("banh").await.unwrap();

    api.fail_next("list_shops", "gateway timeout");
    hold.release();

    assert_eq!(first.await.unwrap().unwrap(), FetchOutcome::Superseded);
    assert!(notifier.toasts().is_empty());
    let items = controller.listing().items().await;
    assert_eq!(items.first().map(|s| s.id.as_str()), Some("s3"));
}

#[tokio::test]
async fn test_latest_failure_keeps_previous_page() {
    let api = Arc::new(pho_shops());
    let notifier = Arc::new(MemoryNotifier::new());
    let controller = ShopsController::new(api.clone(), notifier.clone());
    controller.listing().set_search("pho").await.unwrap();

    api.fail_next("list_shops", "gateway timeout");
    let err = controller
        .filter_by_status(Some(ShopStatus::Inactive))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Api { kind: "shop", .. }));
    assert_eq!(controller.listing().items().await.len(), 2);
    let toasts = notifier.toasts();
    assert_eq!(toasts.len(), 1);
    assert!(toasts.first().unwrap().message.contains("gateway timeout"));
}

#[tokio::test]
async fn test_response_after_dispose_is_ignored() {
    let api = Arc::new(pho_shops());
    let notifier = Arc::new(MemoryNotifier::new());
    let controller = Arc::new(ShopsController::new(api.clone(), notifier.clone()));

    let mut hold = api.hold("list_shops");
    let load = tokio::spawn({
        let controller = controller.clone();
        async move { controller.listing().load().await }
    });
    hold.arrived().await;
    controller.dispose();
    hold.release();

    assert!(matches!(load.await.unwrap(), Err(FetchError::Cancelled)));
    assert!(controller.listing().items().await.is_empty());
    assert!(notifier.toasts().is_empty());

    // Nothing else goes out once disposed.
    assert!(matches!(
        controller.listing().load().await,
        Err(FetchError::Cancelled)
    ));
    assert_eq!(api.calls_to("list_shops"), 1);
}

#[tokio::test]
async fn test_revenue_keeps_the_last_selected_month() {
    let api = Arc::new(MockBackend::new().with_revenue(revenue(1_290_000)));
    let notifier = Arc::new(MemoryNotifier::new());
    let march = RevenuePeriod::new(3, 2025).unwrap();
    let april = RevenuePeriod::new(4, 2025).unwrap();
    let controller = Arc::new(RevenueController::new(
        api.clone(),
        &owner(),
        march,
        notifier.clone(),
    ));

    let mut hold = api.hold("owner_revenue");
    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load().await }
    });
    hold.arrived().await;
    assert!(controller.set_period(april).await.unwrap().is_applied());
    hold.release();

    assert_eq!(first.await.unwrap().unwrap(), FetchOutcome::Superseded);
    assert_eq!(controller.period().await, april);
    assert_eq!(
        api.calls(),
        vec!["owner_revenue owner-1 03/2025", "owner_revenue owner-1 04/2025"]
    );
    let report = controller.report().await.unwrap();
    assert_eq!(report.best_seller().map(|s| s.food_name.as_str()), Some("Pho bo"));
    assert!(!controller.is_loading());
}
