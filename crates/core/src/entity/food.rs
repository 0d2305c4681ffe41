//! Menu items of a shop.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Reference, Resource};
use crate::types::{CategoryId, FoodId, Money, ShopId, UserId};

/// A food item. Availability is a flag, not a status enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    #[serde(rename = "_id")]
    pub id: FoodId,
    #[serde(rename = "shop_id", default)]
    pub shop: Option<Reference<ShopId>>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    /// Percentage off, 0-100.
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(rename = "category_id", default)]
    pub category: Option<Reference<CategoryId>>,
    #[serde(default)]
    pub created_by: Option<Reference<UserId>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_available() -> bool {
    true
}

impl Food {
    /// Price after the discount is applied.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        self.price.discounted(self.discount)
    }

    /// Case-insensitive match of `term` against name and description.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

/// Body of `PUT /owner/food/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FoodPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

impl FoodPatch {
    /// A patch that only flips availability.
    #[must_use]
    pub fn availability(is_available: bool) -> Self {
        Self {
            is_available: Some(is_available),
            ..Self::default()
        }
    }
}

impl Resource for Food {
    type Id = FoodId;
    type Patch = FoodPatch;

    const KIND: &'static str = "food";

    fn id(&self) -> &FoodId {
        &self.id
    }

    fn apply_patch(&mut self, patch: &FoodPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(discount) = patch.discount {
            self.discount = discount;
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = (!image_url.is_empty()).then(|| image_url.clone());
        }
        if let Some(is_available) = patch.is_available {
            self.is_available = is_available;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Food {
        serde_json::from_value(serde_json::json!({
            "_id": "f1",
            "shop_id": "s1",
            "name": "Bun Cha",
            "description": "Grilled pork with vermicelli",
            "price": 50000,
            "discount": 10,
            "image_url": "https://img.example.com/buncha.jpg",
            "is_available": true,
            "category_id": {"_id": "c1", "name": "FOOD"},
            "created_by": "u1",
            "created_at": "2025-09-01T00:00:00Z",
            "updated_at": "2025-09-02T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_decodes_mixed_references() {
        let food = sample();
        assert_eq!(food.shop.as_ref().unwrap().id().as_str(), "s1");
        assert_eq!(food.category.as_ref().unwrap().name(), Some("FOOD"));
        assert_eq!(food.effective_price(), Money::from_dong(45_000));
    }

    #[test]
    fn test_matches_name_or_description() {
        let food = sample();
        assert!(food.matches("bun"));
        assert!(food.matches("PORK"));
        assert!(food.matches("  "));
        assert!(!food.matches("pho"));
    }

    #[test]
    fn test_availability_patch_touches_only_flag() {
        let before = sample();
        let mut after = before.clone();
        after.apply_patch(&FoodPatch::availability(false));
        assert!(!after.is_available);
        assert_eq!(after.price, before.price);
        assert_eq!(after.name, before.name);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[test]
    fn test_empty_image_url_clears_image() {
        let mut food = sample();
        food.apply_patch(&FoodPatch {
            image_url: Some(String::new()),
            ..FoodPatch::default()
        });
        assert_eq!(food.image_url, None);
    }
}
