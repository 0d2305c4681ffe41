//! Scenario tests for the MapFood dashboard controllers.
//!
//! The controllers only talk to the outside world through
//! [`BackendApi`], so the scenarios run against [`MockBackend`]: an in-memory
//! backend that applies the same search, filter and paging rules as the real
//! listing endpoints, persists updates, records every call and can hold a
//! response back until the test lets it go.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mapfood-integration-tests
//! ```
//!
//! # Holding responses
//!
//! ```rust,ignore
//! let mut hold = api.hold("list_shops");
//! let task = tokio::spawn(async move { shops.listing().set_search("pho").await });
//! hold.arrived().await;   // first request is now in flight
//! // ... issue a newer request ...
//! hold.release();         // first response arrives late
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use mapfood_core::entity::{
    Account, AccountPatch, Food, FoodPatch, Order, RevenueReport, Shop, ShopPatch,
};
use mapfood_core::{AccountId, FoodId, OrderId, OrderStatus, Resource, ShopId, UserId};
use mapfood_dashboard::api::{AccountPage, CancelOrderRequest, ListParams, RevenuePeriod, ShopPage};
use mapfood_dashboard::{ApiError, BackendApi, CurrentUser};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

/// Records per page on the paged listing endpoints.
pub const PAGE_SIZE: usize = 2;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Backend double with persistent state and a call log.
#[derive(Default)]
pub struct MockBackend {
    accounts: Mutex<Vec<Account>>,
    shops: Mutex<Vec<Shop>>,
    foods: Mutex<Vec<Food>>,
    orders: Mutex<Vec<Order>>,
    revenue: Mutex<Option<RevenueReport>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, VecDeque<String>>>,
    holds: Mutex<HashMap<&'static str, VecDeque<HeldCall>>>,
}

struct HeldCall {
    arrived: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Handle on a call held back by [`MockBackend::hold`].
pub struct Hold {
    arrived: Option<oneshot::Receiver<()>>,
    release: oneshot::Sender<()>,
}

impl Hold {
    /// Wait until the held call has reached the backend.
    pub async fn arrived(&mut self) {
        if let Some(arrived) = self.arrived.take() {
            let _ = arrived.await;
        }
    }

    /// Let the held call answer.
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_accounts(self, accounts: impl IntoIterator<Item = Account>) -> Self {
        lock(&self.accounts).extend(accounts);
        self
    }

    #[must_use]
    pub fn with_shops(self, shops: impl IntoIterator<Item = Shop>) -> Self {
        lock(&self.shops).extend(shops);
        self
    }

    #[must_use]
    pub fn with_foods(self, foods: impl IntoIterator<Item = Food>) -> Self {
        lock(&self.foods).extend(foods);
        self
    }

    #[must_use]
    pub fn with_orders(self, orders: impl IntoIterator<Item = Order>) -> Self {
        lock(&self.orders).extend(orders);
        self
    }

    #[must_use]
    pub fn with_revenue(self, report: RevenueReport) -> Self {
        *lock(&self.revenue) = Some(report);
        self
    }

    /// Every call so far, oldest first, as `"endpoint args"`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Number of calls made to `endpoint`.
    pub fn calls_to(&self, endpoint: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.split(' ').next() == Some(endpoint))
            .count()
    }

    /// Make the next call to `endpoint` fail with a server error.
    pub fn fail_next(&self, endpoint: &'static str, message: impl Into<String>) {
        lock(&self.failures)
            .entry(endpoint)
            .or_default()
            .push_back(message.into());
    }

    /// Hold the next call to `endpoint` until [`Hold::release`].
    pub fn hold(&self, endpoint: &'static str) -> Hold {
        let (arrived_tx, arrived_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        lock(&self.holds).entry(endpoint).or_default().push_back(HeldCall {
            arrived: arrived_tx,
            release: release_rx,
        });
        Hold {
            arrived: Some(arrived_rx),
            release: release_tx,
        }
    }

    /// Server-side copy of a shop.
    pub fn shop(&self, id: &str) -> Option<Shop> {
        lock(&self.shops).iter().find(|s| s.id.as_str() == id).cloned()
    }

    /// Server-side copy of an order.
    pub fn order(&self, id: &str) -> Option<Order> {
        lock(&self.orders).iter().find(|o| o.id.as_str() == id).cloned()
    }

    async fn answer<T>(
        &self,
        endpoint: &'static str,
        args: String,
        respond: impl FnOnce(&Self) -> Result<T, ApiError> + Send,
    ) -> Result<T, ApiError> {
        lock(&self.calls).push(format!("{endpoint} {args}"));

        let held = lock(&self.holds).get_mut(endpoint).and_then(VecDeque::pop_front);
        if let Some(held) = held {
            let _ = held.arrived.send(());
            let _ = held.release.await;
        }

        let failure = lock(&self.failures).get_mut(endpoint).and_then(VecDeque::pop_front);
        match failure {
            Some(message) => Err(ApiError::Status {
                status: 500,
                message,
            }),
            None => respond(self),
        }
    }
}

fn describe(params: &ListParams) -> String {
    params
        .to_query()
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn body(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn page_of<T: Clone>(items: &[T], page: u32) -> (Vec<T>, u32) {
    let total_pages = items.len().div_ceil(PAGE_SIZE).max(1);
    let skip = usize::try_from(page.saturating_sub(1))
        .unwrap_or(usize::MAX)
        .saturating_mul(PAGE_SIZE);
    let items = items.iter().skip(skip).take(PAGE_SIZE).cloned().collect();
    (items, u32::try_from(total_pages).unwrap_or(u32::MAX))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn patch_one<R: Resource>(items: &mut [R], id: &R::Id, patch: &R::Patch) -> Result<(), ApiError> {
    let item = items
        .iter_mut()
        .find(|item| item.id() == id)
        .ok_or_else(|| ApiError::NotFound(format!("{} {id}", R::KIND)))?;
    item.apply_patch(patch);
    Ok(())
}

impl BackendApi for MockBackend {
    async fn list_accounts(&self, params: &ListParams) -> Result<AccountPage, ApiError> {
        self.answer("list_accounts", describe(params), |backend| {
            let matching: Vec<Account> = lock(&backend.accounts)
                .iter()
                .filter(|a| {
                    params.search.as_deref().is_none_or(|term| {
                        contains_ci(&a.email, term)
                            || a.full_name().is_some_and(|name| contains_ci(name, term))
                    })
                })
                .filter(|a| params.filter("status").is_none_or(|s| a.status.as_str() == s))
                .filter(|a| {
                    params
                        .filter("role")
                        .is_none_or(|role| a.role.as_ref().is_some_and(|r| r.id.as_str() == role))
                })
                .cloned()
                .collect();
            let (accounts, total_pages) = page_of(&matching, params.page);
            Ok(AccountPage {
                accounts,
                total_pages,
            })
        })
        .await
    }

    async fn update_account(&self, id: &AccountId, patch: &AccountPatch) -> Result<(), ApiError> {
        self.answer("update_account", format!("{id} {}", body(patch)), |backend| {
            patch_one(&mut lock(&backend.accounts), id, patch)
        })
        .await
    }

    async fn list_shops(&self, params: &ListParams) -> Result<ShopPage, ApiError> {
        self.answer("list_shops", describe(params), |backend| {
            let matching: Vec<Shop> = lock(&backend.shops)
                .iter()
                .filter(|s| params.search.as_deref().is_none_or(|term| contains_ci(&s.name, term)))
                .filter(|s| params.filter("status").is_none_or(|st| s.status.as_str() == st))
                .cloned()
                .collect();
            let (shops, total_pages) = page_of(&matching, params.page);
            Ok(ShopPage {
                shops,
                total_pages,
                current_page: params.page,
            })
        })
        .await
    }

    async fn update_shop(&self, id: &ShopId, patch: &ShopPatch) -> Result<(), ApiError> {
        self.answer("update_shop", format!("{id} {}", body(patch)), |backend| {
            patch_one(&mut lock(&backend.shops), id, patch)
        })
        .await
    }

    async fn owner_foods(&self, owner: &UserId) -> Result<Vec<Food>, ApiError> {
        self.answer("owner_foods", owner.to_string(), |backend| {
            Ok(lock(&backend.foods).clone())
        })
        .await
    }

    async fn update_food(&self, id: &FoodId, patch: &FoodPatch) -> Result<(), ApiError> {
        self.answer("update_food", format!("{id} {}", body(patch)), |backend| {
            patch_one(&mut lock(&backend.foods), id, patch)
        })
        .await
    }

    async fn owner_shop(&self, owner: &UserId) -> Result<Shop, ApiError> {
        self.answer("owner_shop", owner.to_string(), |backend| {
            lock(&backend.shops)
                .first()
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("shop of {owner}")))
        })
        .await
    }

    async fn update_owner_shop(&self, owner: &UserId, patch: &ShopPatch) -> Result<(), ApiError> {
        self.answer("update_owner_shop", format!("{owner} {}", body(patch)), |backend| {
            let mut shops = lock(&backend.shops);
            let shop = shops
                .first_mut()
                .ok_or_else(|| ApiError::NotFound(format!("shop of {owner}")))?;
            shop.apply_patch(patch);
            Ok(())
        })
        .await
    }

    async fn owner_revenue(
        &self,
        owner: &UserId,
        period: RevenuePeriod,
    ) -> Result<RevenueReport, ApiError> {
        self.answer("owner_revenue", format!("{owner} {period}"), |backend| {
            lock(&backend.revenue)
                .clone()
                .ok_or_else(|| ApiError::NotFound(format!("revenue for {period}")))
        })
        .await
    }

    async fn order_history(&self, user: &UserId) -> Result<Vec<Order>, ApiError> {
        self.answer("order_history", user.to_string(), |backend| {
            Ok(lock(&backend.orders).clone())
        })
        .await
    }

    async fn cancel_order(&self, id: &OrderId, request: &CancelOrderRequest) -> Result<(), ApiError> {
        self.answer("cancel_order", format!("{id} {}", body(request)), |backend| {
            let mut orders = lock(&backend.orders);
            let order = orders
                .iter_mut()
                .find(|o| &o.id == id)
                .ok_or_else(|| ApiError::NotFound(format!("order {id}")))?;
            if order.status != OrderStatus::PendingPayment {
                return Err(ApiError::Rejected("order can no longer be cancelled".to_owned()));
            }
            order.status = OrderStatus::Cancelled;
            Ok(())
        })
        .await
    }
}

/// Fixture records shaped like the backend's JSON.
pub mod fixtures {
    use super::{Account, DeserializeOwned, Food, Order, RevenueReport, Shop};
    use serde_json::{Value, json};

    fn decode<T: DeserializeOwned>(value: Value) -> T {
        match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => panic!("fixture does not decode: {e}"),
        }
    }

    #[must_use]
    pub fn account(id: &str, status: &str) -> Account {
        decode(json!({
            "_id": id,
            "email": format!("{id}@mymapfood.vn"),
            "status": status,
            "email_verified": true,
            "role_id": {"_id": "68e44bdbd727678bb4233108", "name": "CUSTOMER"},
            "user": {"full_name": "Nguyen Van An", "phone": "0901234567"},
            "createdAt": "2025-03-01T08:00:00Z"
        }))
    }

    #[must_use]
    pub fn shop(id: &str, name: &str, status: &str) -> Shop {
        decode(json!({
            "_id": id,
            "name": name,
            "description": "Northern style noodle soup",
            "address": {
                "street": "12 Nguyen Hue",
                "ward": "Ben Nghe",
                "district": "1",
                "city": "Ho Chi Minh",
                "province": "Ho Chi Minh"
            },
            "phone": "0281234567",
            "img": "https://cdn.mymapfood.vn/shops/pho.png",
            "rating": 4.5,
            "status": status
        }))
    }

    #[must_use]
    pub fn food(id: &str, name: &str, price: i64, available: bool) -> Food {
        decode(json!({
            "_id": id,
            "shop_id": "s1",
            "name": name,
            "description": format!("{name} with fresh herbs"),
            "price": price,
            "discount": 10,
            "is_available": available
        }))
    }

    #[must_use]
    pub fn revenue(total: i64) -> RevenueReport {
        decode(json!({
            "shop": {"name": "Pho Hoa"},
            "summary": {
                "totalRevenue": total,
                "totalOrders": 12,
                "totalFoodsSold": 30,
                "uniqueCustomers": 9
            },
            "foodSales": [
                {"foodId": "f1", "foodName": "Pho bo", "totalSold": 18, "totalRevenue": 810000},
                {"foodId": "f2", "foodName": "Pho ga", "totalSold": 12, "totalRevenue": 480000}
            ]
        }))
    }

    #[must_use]
    pub fn order(id: &str, status: &str) -> Order {
        decode(json!({
            "_id": id,
            "orderCode": format!("MF-{id}"),
            "receiverName": "Tran Thi Binh",
            "receiverPhone": "0907654321",
            "shop": {"_id": "s1", "name": "Pho Hoa"},
            "cartItems": [
                {"food": {"_id": "f1", "name": "Pho bo"}, "quantity": 2, "price": 45000}
            ],
            "subtotal": 90000,
            "shippingFee": 15000,
            "discountAmount": 0,
            "totalAmount": 105000,
            "paymentMethod": "COD",
            "paymentStatus": "UNPAID",
            "status": status,
            "createdAt": "2025-03-02T11:30:00Z"
        }))
    }
}

/// Signed-in store director used by the owner-scoped scenarios.
#[must_use]
pub fn owner() -> CurrentUser {
    CurrentUser::new("owner-1", Some(mapfood_core::RoleName::SellerStaff))
}

/// Signed-in customer used by the order scenarios.
#[must_use]
pub fn customer() -> CurrentUser {
    CurrentUser::new("customer-1", Some(mapfood_core::RoleName::Customer))
}
