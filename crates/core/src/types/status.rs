//! Status enums for the marketplace entities.
//!
//! Wire values are the backend's `SCREAMING_SNAKE_CASE` strings. Each enum
//! has `Display`/`FromStr` so the same spelling is used in list filters and
//! request bodies.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not part of its domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownStatus {
    /// Which status domain was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every value of the domain, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The backend's spelling of this value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(UnknownStatus {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Account activation status.
    AccountStatus, "account status" {
        Active => "ACTIVE",
        /// Registered but not (or no longer) allowed to sign in.
        Pending => "PENDING",
    }
}

wire_enum! {
    /// Shop visibility status.
    ShopStatus, "shop status" {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
    }
}

wire_enum! {
    /// Order fulfilment status.
    ///
    /// `Delivered` and `Cancelled` are terminal.
    OrderStatus, "order status" {
        PendingPayment => "PENDING_PAYMENT",
        Confirmed => "CONFIRMED",
        Preparing => "PREPARING",
        Shipped => "SHIPPED",
        Delivered => "DELIVERED",
        Cancelled => "CANCELLED",
    }
}

wire_enum! {
    /// Payment status of an order.
    PaymentStatus, "payment status" {
        Unpaid => "UNPAID",
        Pending => "PENDING",
        Paid => "PAID",
        Refunded => "REFUNDED",
        Failed => "FAILED",
    }
}

wire_enum! {
    /// Role names in the fixed role set.
    RoleName, "role" {
        Admin => "ADMIN",
        Customer => "CUSTOMER",
        SellerStaff => "SELLER_STAFF",
    }
}

impl OrderStatus {
    /// Whether no further transition can leave this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Human-readable label shown in order history.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PendingPayment => "Awaiting payment",
            Self::Confirmed => "Confirmed",
            Self::Preparing => "Preparing",
            Self::Shipped => "Out for delivery",
            Self::Delivered => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl PaymentStatus {
    /// Order history only distinguishes paid from not-yet-paid.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Refunded => "Refunded",
            Self::Unpaid | Self::Pending | Self::Failed => "Unpaid",
        }
    }
}

/// How the customer pays for an order.
///
/// Unknown methods are kept verbatim so a new gateway on the backend does not
/// break decoding of the whole history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// Any other gateway name, as sent by the backend.
    Other(String),
}

impl PaymentMethod {
    /// Label shown in order history.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Cod => "Cash on delivery",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(s: String) -> Self {
        if s == "COD" { Self::Cod } else { Self::Other(s) }
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cod => "COD".to_owned(),
            PaymentMethod::Other(name) => name,
        }
    }
}
