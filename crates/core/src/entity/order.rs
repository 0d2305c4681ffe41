//! Customer orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Resource;
use super::shop::Address;
use crate::types::{FoodId, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ShopId, UserId};

/// An order as returned by the order history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_code: String,
    #[serde(default)]
    pub customer: Option<OrderCustomer>,
    #[serde(flatten)]
    pub receiver: Receiver,
    #[serde(default)]
    pub shop: Option<OrderShop>,
    #[serde(rename = "cartItems", default)]
    pub items: Vec<OrderLineItem>,
    #[serde(default)]
    pub subtotal: Money,
    #[serde(default)]
    pub shipping_fee: Money,
    #[serde(default)]
    pub discount_amount: Money,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Who receives the delivery. Sent flat on the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    #[serde(rename = "receiverName", default)]
    pub name: Option<String>,
    #[serde(rename = "receiverPhone", default)]
    pub phone: Option<String>,
    #[serde(rename = "receiverEmail", default)]
    pub email: Option<String>,
}

/// Populated customer reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    #[serde(rename = "_id", default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Populated shop reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShop {
    #[serde(rename = "_id", default)]
    pub id: Option<ShopId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub address: Address,
}

/// One cart line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    #[serde(default)]
    pub food: Option<LineItemFood>,
    pub quantity: u32,
    pub price: Money,
    #[serde(default)]
    pub note: Option<String>,
}

/// Food summary embedded in a cart line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemFood {
    #[serde(rename = "_id", default)]
    pub id: Option<FoodId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
}

impl OrderLineItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }

    /// Best image for the line: the food's image, else the fallback.
    #[must_use]
    pub fn image<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.food
            .as_ref()
            .and_then(|f| f.image_url.as_deref().or(f.img.as_deref()))
            .or(fallback)
    }
}

impl Order {
    /// Whether the order still belongs in the "unfinished" tab.
    #[must_use]
    pub const fn is_unfinished(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Local patch applied after a successful order mutation.
///
/// The cancel endpoint takes a reason, not an order body, so this only
/// describes the fields the client knows changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
}

impl Resource for Order {
    type Id = OrderId;
    type Patch = OrderPatch;

    const KIND: &'static str = "order";

    fn id(&self) -> &OrderId {
        &self.id
    }

    fn apply_patch(&mut self, patch: &OrderPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}
