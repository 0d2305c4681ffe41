//! `reqwest` implementation of [`BackendApi`].

use std::sync::Arc;

use mapfood_core::entity::{AccountPatch, Food, FoodPatch, Order, RevenueReport, Shop, ShopPatch};
use mapfood_core::{AccountId, FoodId, OrderId, ShopId, UserId};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::types::decode;
use super::{
    AccountPage, ApiError, BackendApi, CancelOrderRequest, Envelope, ListParams, RevenuePeriod,
    ShopPage,
};
use crate::config::ApiConfig;

/// Default wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// HTTP client for the MapFood backend.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The API root requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve `segments` under the API root. Each segment is
    /// percent-encoded, so an id can never change which endpoint is hit.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Status {
                status: 0,
                message: format!("base URL {} cannot carry a path", self.inner.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request.
    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.url(path)?).send().await?;
        self.handle_response(&path.join("/"), response).await
    }

    /// Execute a GET request with a query string.
    async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized + Sync>(
        &self,
        path: &[&str],
        query: &Q,
    ) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.url(path)?).query(query).send().await?;
        self.handle_response(&path.join("/"), response).await
    }

    /// Execute a PUT request.
    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.inner.client.put(self.url(path)?).json(body).send().await?;
        self.handle_response(&path.join("/"), response).await
    }

    /// Execute a POST request.
    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.inner.client.post(self.url(path)?).json(body).send().await?;
        self.handle_response(&path.join("/"), response).await
    }

    /// Handle API response and decode JSON.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            debug!(path, status = status.as_u16(), bytes = body.len(), "Backend response");
            // 204 and empty 200 bodies decode as JSON null
            let body: &[u8] = if body.is_empty() { b"null" } else { &body };
            return decode(path, body);
        }

        Err(self.parse_error(response).await)
    }

    /// Map a non-success response to an error.
    async fn parse_error(&self, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return ApiError::RateLimited(retry_after);
        }

        if status == 401 || status == 403 {
            return ApiError::Unauthorized;
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = error_message(&body);

        if status == 404 {
            return ApiError::NotFound(message);
        }

        ApiError::Status { status, message }
    }
}

/// The backend's `{"message": ...}` when present, else the raw body.
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BackendApi for HttpBackend {
    #[instrument(skip(self, params), fields(page = params.page))]
    async fn list_accounts(&self, params: &ListParams) -> Result<AccountPage, ApiError> {
        self.get_with_query(&["admin", "listAccount"], &params.to_query()).await
    }

    #[instrument(skip(self, id, patch), fields(account_id = %id))]
    async fn update_account(&self, id: &AccountId, patch: &AccountPatch) -> Result<(), ApiError> {
        let _: serde_json::Value = self.put(&["admin", "updateAccount", id.as_str()], patch).await?;
        Ok(())
    }

    #[instrument(skip(self, params), fields(page = params.page))]
    async fn list_shops(&self, params: &ListParams) -> Result<ShopPage, ApiError> {
        self.get_with_query(&["admin", "listShops"], &params.to_query()).await
    }

    #[instrument(skip(self, id, patch), fields(shop_id = %id))]
    async fn update_shop(&self, id: &ShopId, patch: &ShopPatch) -> Result<(), ApiError> {
        let _: serde_json::Value = self.put(&["admin", "updateShop", id.as_str()], patch).await?;
        Ok(())
    }

    #[instrument(skip(self, owner), fields(owner_id = %owner))]
    async fn owner_foods(&self, owner: &UserId) -> Result<Vec<Food>, ApiError> {
        let path = ["owner", owner.as_str(), "foods"];
        let envelope: Envelope<Vec<Food>> = self.get(&path).await?;
        envelope.into_data(&path.join("/"))
    }

    #[instrument(skip(self, id, patch), fields(food_id = %id))]
    async fn update_food(&self, id: &FoodId, patch: &FoodPatch) -> Result<(), ApiError> {
        let _: serde_json::Value = self.put(&["owner", "food", id.as_str()], patch).await?;
        Ok(())
    }

    #[instrument(skip(self, owner), fields(owner_id = %owner))]
    async fn owner_shop(&self, owner: &UserId) -> Result<Shop, ApiError> {
        let path = ["owner", owner.as_str(), "shop"];
        let envelope: Envelope<Shop> = self.get(&path).await?;
        envelope.into_data(&path.join("/"))
    }

    #[instrument(skip(self, owner, patch), fields(owner_id = %owner))]
    async fn update_owner_shop(&self, owner: &UserId, patch: &ShopPatch) -> Result<(), ApiError> {
        let envelope: Envelope<serde_json::Value> =
            self.put(&["owner", owner.as_str(), "shop"], patch).await?;
        envelope.into_ack()
    }

    #[instrument(skip(self, owner, period), fields(owner_id = %owner, period = %period))]
    async fn owner_revenue(
        &self,
        owner: &UserId,
        period: RevenuePeriod,
    ) -> Result<RevenueReport, ApiError> {
        let path = ["owner", owner.as_str(), "revenue"];
        let envelope: Envelope<RevenueReport> = self.get_with_query(&path, &period).await?;
        envelope.into_data(&path.join("/"))
    }

    #[instrument(skip(self, user), fields(user_id = %user))]
    async fn order_history(&self, user: &UserId) -> Result<Vec<Order>, ApiError> {
        let path = ["orders", "history"];
        let envelope: Envelope<Vec<Order>> =
            self.get_with_query(&path, &[("userId", user.as_str())]).await?;
        envelope.into_data(&path.join("/"))
    }

    #[instrument(skip(self, id, request), fields(order_id = %id))]
    async fn cancel_order(&self, id: &OrderId, request: &CancelOrderRequest) -> Result<(), ApiError> {
        let envelope: Envelope<serde_json::Value> =
            self.post(&["orders", "cancel", id.as_str()], request).await?;
        envelope.into_ack()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&ApiConfig {
            base_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_paths_join_under_api_root() {
        let backend = backend("https://backmymapfood.onrender.com/api/");
        assert_eq!(
            backend.url(&["admin", "listShops"]).unwrap().as_str(),
            "https://backmymapfood.onrender.com/api/admin/listShops"
        );
        assert_eq!(
            backend.url(&["owner", "u1", "foods"]).unwrap().as_str(),
            "https://backmymapfood.onrender.com/api/owner/u1/foods"
        );
    }

    #[test]
    fn test_ids_stay_inside_their_segment() {
        let backend = backend("https://backmymapfood.onrender.com/api/");
        let url = backend.url(&["owner", "u1/shop?x#y", "foods"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://backmymapfood.onrender.com/api/owner/u1%2Fshop%3Fx%23y/foods"
        );
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        assert_eq!(error_message(r#"{"message":"Account not found"}"#), "Account not found");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_debug_shows_base_url_only() {
        let debug = format!("{:?}", backend("http://localhost:9999/api/"));
        assert!(debug.contains("http://localhost:9999/api/"));
    }
}
