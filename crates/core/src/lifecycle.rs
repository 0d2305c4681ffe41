//! Lifecycle policy: legal statuses, transitions and action eligibility.
//!
//! Each entity type declares which actions the dashboard may offer for a given
//! record and what status an action leads to. Controllers only render a
//! control when [`Lifecycle::allowed_actions`] contains its action, and they
//! call [`Lifecycle::apply`] before sending anything to the backend.
//!
//! | Entity | Transitions driven from the dashboards |
//! |---|---|
//! | Account | `ACTIVE` ⇄ `PENDING` (administrator) |
//! | Shop | `ACTIVE` ⇄ `INACTIVE` (administrator) |
//! | Food | available ⇄ unavailable (store director) |
//! | Order | `PENDING_PAYMENT` → `CANCELLED` (customer) |
//!
//! The rest of the order graph (`PENDING_PAYMENT` → `CONFIRMED` → `PREPARING`
//! → `SHIPPED` → `DELIVERED`) is driven by the backend and only exposed here
//! through [`OrderStatus::can_transition_to`].

use core::fmt;

use thiserror::Error;

use crate::entity::{Account, Food, Order, Shop};
use crate::types::{AccountStatus, OrderStatus, ShopStatus};

/// An action was requested that the entity's current status does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} {kind} in status {from}")]
pub struct InvalidTransition {
    /// Entity kind (`account`, `order`, ...).
    pub kind: &'static str,
    /// Status the entity was in.
    pub from: String,
    /// The rejected action.
    pub action: String,
}

/// Per-entity status machine.
pub trait Lifecycle {
    /// Status domain of the entity.
    type Status: Copy + Eq + fmt::Display;
    /// Actions the dashboards can trigger.
    type Action: Copy + Eq + fmt::Display;

    /// Entity kind used in error messages.
    const KIND: &'static str;

    /// Current status.
    fn status(&self) -> Self::Status;

    /// Actions offered for the entity in its current status.
    fn allowed_actions(&self) -> Vec<Self::Action>;

    /// Status reached by `action` from `status`, ignoring eligibility.
    fn target(status: Self::Status, action: Self::Action) -> Self::Status;

    /// Whether `action` may be offered right now.
    fn can(&self, action: Self::Action) -> bool {
        self.allowed_actions().contains(&action)
    }

    /// Status after `action`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when `action` is not in
    /// [`Lifecycle::allowed_actions`].
    fn apply(&self, action: Self::Action) -> Result<Self::Status, InvalidTransition> {
        if self.can(action) {
            Ok(Self::target(self.status(), action))
        } else {
            Err(InvalidTransition {
                kind: Self::KIND,
                from: self.status().to_string(),
                action: action.to_string(),
            })
        }
    }
}

/// Administrator actions on accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountAction {
    Activate,
    Deactivate,
}

/// Administrator actions on shops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShopAction {
    Activate,
    Deactivate,
}

/// Store-director actions on menu items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodAction {
    MarkAvailable,
    MarkUnavailable,
}

/// Customer actions on orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    Cancel,
}

/// Availability of a food item, seen as a two-state status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    /// Map the backend's `is_available` flag.
    #[must_use]
    pub const fn from_flag(is_available: bool) -> Self {
        if is_available {
            Self::Available
        } else {
            Self::Unavailable
        }
    }

    /// Back to the backend's flag.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

macro_rules! display_as {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $(Self::$variant => $text),+
                })
            }
        }
    };
}

display_as!(AccountAction { Activate => "activate", Deactivate => "deactivate" });
display_as!(ShopAction { Activate => "activate", Deactivate => "deactivate" });
display_as!(FoodAction { MarkAvailable => "mark available", MarkUnavailable => "mark unavailable" });
display_as!(OrderAction { Cancel => "cancel" });
display_as!(Availability { Available => "AVAILABLE", Unavailable => "UNAVAILABLE" });

impl AccountAction {
    /// Whether the action takes something away and must be confirmed.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Deactivate)
    }
}

impl ShopAction {
    /// Whether the action takes something away and must be confirmed.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Deactivate)
    }
}

impl OrderStatus {
    /// Statuses directly reachable from this one.
    #[must_use]
    pub const fn next_statuses(self) -> &'static [Self] {
        match self {
            Self::PendingPayment => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Preparing],
            Self::Preparing => &[Self::Shipped],
            Self::Shipped => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether the backend may move an order from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.next_statuses().contains(&next)
    }
}

impl Lifecycle for Account {
    type Status = AccountStatus;
    type Action = AccountAction;

    const KIND: &'static str = "account";

    fn status(&self) -> AccountStatus {
        self.status
    }

    fn allowed_actions(&self) -> Vec<AccountAction> {
        match self.status {
            AccountStatus::Active => vec![AccountAction::Deactivate],
            AccountStatus::Pending => vec![AccountAction::Activate],
        }
    }

    fn target(_status: AccountStatus, action: AccountAction) -> AccountStatus {
        match action {
            AccountAction::Activate => AccountStatus::Active,
            AccountAction::Deactivate => AccountStatus::Pending,
        }
    }
}

impl Lifecycle for Shop {
    type Status = ShopStatus;
    type Action = ShopAction;

    const KIND: &'static str = "shop";

    fn status(&self) -> ShopStatus {
        self.status
    }

    fn allowed_actions(&self) -> Vec<ShopAction> {
        match self.status {
            ShopStatus::Active => vec![ShopAction::Deactivate],
            ShopStatus::Inactive => vec![ShopAction::Activate],
        }
    }

    fn target(_status: ShopStatus, action: ShopAction) -> ShopStatus {
        match action {
            ShopAction::Activate => ShopStatus::Active,
            ShopAction::Deactivate => ShopStatus::Inactive,
        }
    }
}

impl Lifecycle for Food {
    type Status = Availability;
    type Action = FoodAction;

    const KIND: &'static str = "food";

    fn status(&self) -> Availability {
        Availability::from_flag(self.is_available)
    }

    fn allowed_actions(&self) -> Vec<FoodAction> {
        if self.is_available {
            vec![FoodAction::MarkUnavailable]
        } else {
            vec![FoodAction::MarkAvailable]
        }
    }

    fn target(_status: Availability, action: FoodAction) -> Availability {
        match action {
            FoodAction::MarkAvailable => Availability::Available,
            FoodAction::MarkUnavailable => Availability::Unavailable,
        }
    }
}

impl Lifecycle for Order {
    type Status = OrderStatus;
    type Action = OrderAction;

    const KIND: &'static str = "order";

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn allowed_actions(&self) -> Vec<OrderAction> {
        if self.status == OrderStatus::PendingPayment {
            vec![OrderAction::Cancel]
        } else {
            Vec::new()
        }
    }

    fn target(_status: OrderStatus, action: OrderAction) -> OrderStatus {
        match action {
            OrderAction::Cancel => OrderStatus::Cancelled,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(status: &str) -> Order {
        serde_json::from_value(serde_json::json!({"_id": "o1", "status": status})).unwrap()
    }

    fn account(status: &str) -> Account {
        serde_json::from_value(serde_json::json!({
            "_id": "a1",
            "email": "a@example.com",
            "status": status
        }))
        .unwrap()
    }

    #[test]
    fn test_cancel_only_while_pending_payment() {
        let pending = order("PENDING_PAYMENT");
        assert_eq!(pending.allowed_actions(), vec![OrderAction::Cancel]);
        assert_eq!(pending.apply(OrderAction::Cancel).unwrap(), OrderStatus::Cancelled);

        for status in ["CONFIRMED", "PREPARING", "SHIPPED", "DELIVERED", "CANCELLED"] {
            let o = order(status);
            assert!(o.allowed_actions().is_empty(), "{status} should offer nothing");
            assert!(o.apply(OrderAction::Cancel).is_err());
        }
    }

    #[test]
    fn test_cancel_shipped_order_error() {
        let err = order("SHIPPED").apply(OrderAction::Cancel).unwrap_err();
        assert_eq!(err.kind, "order");
        assert_eq!(err.from, "SHIPPED");
        assert_eq!(err.to_string(), "cannot cancel order in status SHIPPED");
    }

    #[test]
    fn test_account_toggle() {
        let active = account("ACTIVE");
        assert_eq!(active.apply(AccountAction::Deactivate).unwrap(), AccountStatus::Pending);
        assert!(active.apply(AccountAction::Activate).is_err());

        let pending = account("PENDING");
        assert_eq!(pending.apply(AccountAction::Activate).unwrap(), AccountStatus::Active);
        assert!(pending.apply(AccountAction::Deactivate).is_err());
    }

    #[test]
    fn test_order_graph() {
        use OrderStatus::*;
        assert!(PendingPayment.can_transition_to(Confirmed));
        assert!(PendingPayment.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Confirmed.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(PendingPayment));

        for status in OrderStatus::ALL {
            assert_eq!(status.is_terminal(), status.next_statuses().is_empty());
        }
    }

    #[test]
    fn test_destructive_actions() {
        assert!(AccountAction::Deactivate.is_destructive());
        assert!(!AccountAction::Activate.is_destructive());
        assert!(ShopAction::Deactivate.is_destructive());
    }

    #[test]
    fn test_availability_flag_roundtrip() {
        assert!(Availability::from_flag(true).is_available());
        assert!(!Availability::from_flag(false).is_available());
    }
}
