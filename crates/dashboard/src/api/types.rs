//! Request and response records of the backend endpoints.

use std::collections::BTreeMap;

use chrono::Datelike;
use mapfood_core::entity::{Account, Shop};
use mapfood_core::query::QuerySnapshot;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use super::{ApiError, DecodeError};

const fn one() -> u32 {
    1
}

/// Query parameters of a paged listing endpoint.
///
/// Only meaningful values are carried: no `search` when the term is blank and
/// no filter whose value is the default `all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    /// First page, no search, no filters.
    #[must_use]
    pub const fn first_page() -> Self {
        Self {
            page: 1,
            search: None,
            filters: BTreeMap::new(),
        }
    }

    /// Value of a non-default filter.
    #[must_use]
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Pairs for the request's query string.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![("page".to_string(), self.page.to_string())];
        if let Some(search) = &self.search {
            query.push(("search".to_string(), search.clone()));
        }
        query.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        query
    }
}

impl From<&QuerySnapshot> for ListParams {
    fn from(snapshot: &QuerySnapshot) -> Self {
        Self {
            page: snapshot.page,
            search: snapshot.search_term().map(str::to_string),
            filters: snapshot
                .filters
                .keys()
                .filter_map(|k| snapshot.filter(k).map(|v| (k.clone(), v.to_string())))
                .collect(),
        }
    }
}

/// Response of `GET admin/listAccount`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountPage {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(rename = "totalPages", default = "one")]
    pub total_pages: u32,
}

/// Response of `GET admin/listShops`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopPage {
    #[serde(default)]
    pub shops: Vec<Shop>,
    #[serde(rename = "totalPages", default = "one")]
    pub total_pages: u32,
    #[serde(rename = "currentPage", default = "one")]
    pub current_page: u32,
}

/// `{success, data, message}` wrapper used by the owner and order endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// The payload of a successful envelope.
    ///
    /// # Errors
    ///
    /// `Rejected` when `success` is false, `Decode` when a successful
    /// envelope carries no `data`.
    pub fn into_data(self, endpoint: &str) -> Result<T, ApiError> {
        if !self.success {
            return Err(self.rejection());
        }
        self.data.ok_or_else(|| {
            ApiError::Decode(DecodeError {
                endpoint: endpoint.to_string(),
                source: <serde_json::Error as serde::de::Error>::missing_field("data"),
            })
        })
    }

    /// Check the `success` flag, ignoring any payload.
    ///
    /// # Errors
    ///
    /// `Rejected` when `success` is false.
    pub fn into_ack(self) -> Result<(), ApiError> {
        if self.success { Ok(()) } else { Err(self.rejection()) }
    }

    fn rejection(self) -> ApiError {
        ApiError::Rejected(
            self.message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "request rejected by server".to_string()),
        )
    }
}

/// Decode `body` as `T`, naming `endpoint` on failure.
///
/// # Errors
///
/// Returns `ApiError::Decode` when the body does not match `T`.
pub fn decode<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|source| {
        ApiError::Decode(DecodeError {
            endpoint: endpoint.to_string(),
            source,
        })
    })
}

/// A month outside 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid month: {0} (expected 1-12)")]
pub struct InvalidPeriod(pub u32);

/// One calendar month of revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RevenuePeriod {
    month: u32,
    year: i32,
}

impl RevenuePeriod {
    /// # Errors
    ///
    /// Returns `InvalidPeriod` unless `month` is within 1-12.
    pub const fn new(month: u32, year: i32) -> Result<Self, InvalidPeriod> {
        if month >= 1 && month <= 12 {
            Ok(Self { month, year })
        } else {
            Err(InvalidPeriod(month))
        }
    }

    /// The current month in local time.
    #[must_use]
    pub fn current() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            month: today.month(),
            year: today.year(),
        }
    }

    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }
}

impl std::fmt::Display for RevenuePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Body of `POST orders/cancel/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CancelOrderRequest {
    #[serde(rename = "cancelReason", skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl CancelOrderRequest {
    /// A blank reason is sent as no reason at all.
    #[must_use]
    pub fn new(reason: Option<&str>) -> Self {
        Self {
            cancel_reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mapfood_core::query::{FILTER_ALL, QueryState};

    use super::*;

    #[test]
    fn test_list_params_omit_defaults() {
        let mut query = QueryState::new()
            .with_filter("role", FILTER_ALL)
            .with_filter("status", FILTER_ALL);
        let params = ListParams::from(&query.snapshot());
        assert_eq!(params, ListParams::first_page());
        assert_eq!(params.to_query(), vec![("page".to_string(), "1".to_string())]);

        query.set_search("  pho ");
        query.set_filter("status", "ACTIVE");
        let params = ListParams::from(&query.snapshot());
        assert_eq!(params.search.as_deref(), Some("pho"));
        assert_eq!(params.filter("status"), Some("ACTIVE"));
        assert_eq!(params.filter("role"), None);
    }

    #[test]
    fn test_account_page_defaults_total_pages() {
        let page: AccountPage = serde_json::from_str(r#"{"accounts": []}"#).unwrap();
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_envelope_rejection_and_missing_data() {
        let rejected: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"success": false, "message": "shop not found"}"#).unwrap();
        let err = rejected.into_data("owner/u1/foods").unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "shop not found"));

        let empty: Envelope<Vec<u32>> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        let err = empty.into_data("owner/u1/foods").unwrap_err();
        assert!(matches!(err, ApiError::Decode(ref d) if d.endpoint == "owner/u1/foods"));

        let ok: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"success": true, "data": [1, 2]}"#).unwrap();
        assert_eq!(ok.into_data("x").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_decode_reports_endpoint() {
        let err = decode::<AccountPage>("admin/listAccount", br#"{"accounts": 7}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(ref d) if d.endpoint == "admin/listAccount"));
    }

    #[test]
    fn test_revenue_period_bounds() {
        assert!(RevenuePeriod::new(0, 2025).is_err());
        assert!(RevenuePeriod::new(13, 2025).is_err());
        let period = RevenuePeriod::new(3, 2025).unwrap();
        assert_eq!(period.to_string(), "03/2025");
        let current = RevenuePeriod::current();
        assert!((1..=12).contains(&current.month()));
    }

    #[test]
    fn test_cancel_request_body() {
        let body = serde_json::to_value(CancelOrderRequest::new(Some("  "))).unwrap();
        assert_eq!(body, serde_json::json!({}));

        let body = serde_json::to_value(CancelOrderRequest::new(Some("ordered twice"))).unwrap();
        assert_eq!(body, serde_json::json!({"cancelReason": "ordered twice"}));
    }
}
