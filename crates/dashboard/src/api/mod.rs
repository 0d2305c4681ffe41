//! Backend API boundary.
//!
//! [`BackendApi`] is the seam every controller talks through: one method per
//! endpoint, typed request records in, typed response records out. The
//! production implementation is [`HttpBackend`]; tests substitute an
//! in-memory backend.
//!
//! # Endpoints
//!
//! | Method | Endpoint |
//! |---|---|
//! | [`BackendApi::list_accounts`] | `GET admin/listAccount` |
//! | [`BackendApi::update_account`] | `PUT admin/updateAccount/{id}` |
//! | [`BackendApi::list_shops`] | `GET admin/listShops` |
//! | [`BackendApi::update_shop`] | `PUT admin/updateShop/{id}` |
//! | [`BackendApi::owner_foods`] | `GET owner/{ownerId}/foods` |
//! | [`BackendApi::update_food`] | `PUT owner/food/{id}` |
//! | [`BackendApi::owner_shop`] | `GET owner/{ownerId}/shop` |
//! | [`BackendApi::update_owner_shop`] | `PUT owner/{ownerId}/shop` |
//! | [`BackendApi::owner_revenue`] | `GET owner/{ownerId}/revenue` |
//! | [`BackendApi::order_history`] | `GET orders/history?userId=` |
//! | [`BackendApi::cancel_order`] | `POST orders/cancel/{id}` |

mod client;
mod types;

pub use client::HttpBackend;
pub use types::*;

use std::future::Future;

use mapfood_core::entity::{AccountPatch, Food, FoodPatch, Order, RevenueReport, Shop, ShopPatch};
use mapfood_core::{AccountId, FoodId, OrderId, ShopId, UserId};
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected record.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Backend answered `success: false`.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Session no longer accepted by the backend.
    #[error("Unauthorized")]
    Unauthorized,
}

/// A response body that could not be decoded into its typed record.
#[derive(Debug, Error)]
#[error("failed to decode response from {endpoint}: {source}")]
pub struct DecodeError {
    /// Endpoint path the body came from.
    pub endpoint: String,
    #[source]
    pub source: serde_json::Error,
}

impl ApiError {
    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) | Self::Rejected(_) | Self::NotFound(_) | Self::Unauthorized => false,
        }
    }
}

/// Typed access to the MapFood backend.
pub trait BackendApi: Send + Sync + 'static {
    /// One page of accounts matching `params`.
    fn list_accounts(
        &self,
        params: &ListParams,
    ) -> impl Future<Output = Result<AccountPage, ApiError>> + Send;

    /// Partial update of an account and its user profile.
    fn update_account(
        &self,
        id: &AccountId,
        patch: &AccountPatch,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// One page of shops matching `params`.
    fn list_shops(&self, params: &ListParams)
    -> impl Future<Output = Result<ShopPage, ApiError>> + Send;

    /// Partial update of a shop (administrator).
    fn update_shop(
        &self,
        id: &ShopId,
        patch: &ShopPatch,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Whole menu of the shop owned by `owner`.
    fn owner_foods(&self, owner: &UserId) -> impl Future<Output = Result<Vec<Food>, ApiError>> + Send;

    /// Partial update of a menu item.
    fn update_food(
        &self,
        id: &FoodId,
        patch: &FoodPatch,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Shop owned by `owner`.
    fn owner_shop(&self, owner: &UserId) -> impl Future<Output = Result<Shop, ApiError>> + Send;

    /// Partial update of the shop owned by `owner`.
    fn update_owner_shop(
        &self,
        owner: &UserId,
        patch: &ShopPatch,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Revenue of the shop owned by `owner` for one month.
    fn owner_revenue(
        &self,
        owner: &UserId,
        period: RevenuePeriod,
    ) -> impl Future<Output = Result<RevenueReport, ApiError>> + Send;

    /// Every order placed by `user`.
    fn order_history(&self, user: &UserId) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    /// Cancel an order on behalf of its customer.
    fn cancel_order(
        &self,
        id: &OrderId,
        request: &CancelOrderRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");

        let err = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");
        assert!(err.is_transient());

        assert!(!ApiError::Rejected("no".to_string()).is_transient());
    }

    #[test]
    fn test_decode_error_names_endpoint() {
        let source = serde_json::from_str::<Vec<u32>>("{").err();
        let Some(source) = source else {
            panic!("malformed JSON must fail to parse");
        };
        let err = ApiError::from(DecodeError {
            endpoint: "orders/history".to_string(),
            source,
        });
        assert!(err.to_string().starts_with("failed to decode response from orders/history"));
        assert!(!err.is_transient());
    }
}
