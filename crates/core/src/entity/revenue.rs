//! Monthly revenue aggregates for a shop owner.

use serde::{Deserialize, Serialize};

use crate::types::{FoodId, Money};

/// Revenue report for one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    #[serde(default)]
    pub shop: Option<RevenueShop>,
    #[serde(default)]
    pub summary: RevenueSummary,
    #[serde(default)]
    pub food_sales: Vec<FoodSale>,
}

/// Shop the report belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueShop {
    #[serde(default)]
    pub name: String,
}

/// Headline numbers of the month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    #[serde(default)]
    pub total_revenue: Money,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_foods_sold: u64,
    #[serde(default)]
    pub unique_customers: u64,
}

/// Sales of one food item during the month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSale {
    pub food_id: FoodId,
    #[serde(default)]
    pub food_name: String,
    #[serde(default)]
    pub total_sold: u64,
    #[serde(default)]
    pub total_revenue: Money,
}

impl RevenueReport {
    /// Best-selling food by quantity, if any sold.
    #[must_use]
    pub fn best_seller(&self) -> Option<&FoodSale> {
        self.food_sales
            .iter()
            .filter(|sale| sale.total_sold > 0)
            .max_by_key(|sale| sale.total_sold)
    }
}
