//! Order history of the signed-in customer.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use mapfood_core::entity::{Order, OrderPatch};
use mapfood_core::lifecycle::OrderAction;
use mapfood_core::query::{FILTER_ALL, QuerySnapshot, QueryState};
use mapfood_core::{OrderId, UserId};
use tracing::instrument;

use super::{Transition, open_transition, recheck};
use crate::api::{ApiError, BackendApi, CancelOrderRequest};
use crate::error::{FetchError, MutationError};
use crate::gate::{ConfirmationGate, GateOutcome};
use crate::listing::{FetchOutcome, ListingController, ListingSource, Page};
use crate::mutation::{Mutation, MutationOutcome, Reconcile};
use crate::notify::Notifier;
use crate::session::CurrentUser;

const TAB: &str = "tab";

/// Tabs of the order history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderTab {
    #[default]
    All,
    /// Orders that can still move forward.
    Unfinished,
    /// Delivered or cancelled.
    Completed,
}

impl OrderTab {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => FILTER_ALL,
            Self::Unfinished => "unfinished",
            Self::Completed => "completed",
        }
    }

    /// Whether `order` is listed under this tab.
    #[must_use]
    pub const fn contains(self, order: &Order) -> bool {
        match self {
            Self::All => true,
            Self::Unfinished => order.is_unfinished(),
            Self::Completed => !order.is_unfinished(),
        }
    }
}

impl fmt::Display for OrderTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            FILTER_ALL => Ok(Self::All),
            "unfinished" => Ok(Self::Unfinished),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown order tab: {other}")),
        }
    }
}

/// Every order of one customer.
pub struct OrderSource<B> {
    api: Arc<B>,
    user: UserId,
}

impl<B: BackendApi> ListingSource<Order> for OrderSource<B> {
    const LOCAL_QUERY: bool = true;

    async fn fetch(&self, _query: &QuerySnapshot) -> Result<Page<Order>, ApiError> {
        let orders = self.api.order_history(&self.user).await?;
        Ok(Page::single(orders))
    }

    fn matches(item: &Order, query: &QuerySnapshot) -> bool {
        query
            .filter(TAB)
            .and_then(|tab| tab.parse::<OrderTab>().ok())
            .unwrap_or_default()
            .contains(item)
    }
}

pub struct OrdersController<B: BackendApi> {
    api: Arc<B>,
    listing: ListingController<Order, OrderSource<B>>,
    cancel: ConfirmationGate<Transition<Order>>,
}

impl<B: BackendApi> OrdersController<B> {
    #[must_use]
    pub fn new(api: Arc<B>, user: &CurrentUser, notifier: Arc<dyn Notifier>) -> Self {
        let source = OrderSource {
            api: api.clone(),
            user: user.id.clone(),
        };
        Self {
            listing: ListingController::new(
                source,
                QueryState::new().with_filter(TAB, FILTER_ALL),
                notifier,
            ),
            api,
            cancel: ConfirmationGate::new(),
        }
    }

    pub const fn listing(&self) -> &ListingController<Order, OrderSource<B>> {
        &self.listing
    }

    pub const fn cancel_gate(&self) -> &ConfirmationGate<Transition<Order>> {
        &self.cancel
    }

    /// Switch tabs; never refetches.
    ///
    /// # Errors
    ///
    /// Never fails in practice; tabs are applied in memory.
    pub async fn select_tab(&self, tab: OrderTab) -> Result<FetchOutcome, FetchError> {
        self.listing.set_filter(TAB, tab.as_str()).await
    }

    /// Currently selected tab.
    pub async fn tab(&self) -> OrderTab {
        self.listing
            .query()
            .await
            .filter(TAB)
            .and_then(|tab| tab.parse().ok())
            .unwrap_or_default()
    }

    /// Open the cancel confirmation for `id`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the order is awaiting payment, `NotLoaded`
    /// when the order is unknown, `InFlight` while another cancellation is
    /// being confirmed.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn request_cancel(&self, id: &OrderId) -> Result<Transition<Order>, MutationError> {
        open_transition(
            &self.listing,
            &self.cancel,
            id,
            Some(OrderAction::Cancel),
            |order: &Order| order.order_code.clone(),
        )
        .await
    }

    pub fn dismiss_cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Send the pending cancellation with an optional reason.
    #[instrument(skip(self, reason))]
    pub async fn confirm_cancel(
        &self,
        reason: Option<&str>,
    ) -> GateOutcome<Result<MutationOutcome, MutationError>> {
        let request = CancelOrderRequest::new(reason);
        self.cancel
            .confirm(|pending| async move {
                let (_, next) = recheck(&self.listing, &pending).await?;
                let patch = OrderPatch { status: Some(next) };
                let mutation = Mutation::new(pending.id.clone(), Reconcile::Patch(patch))
                    .with_messages(
                        format!("Order {} cancelled", pending.label),
                        format!("Could not cancel order {}", pending.label),
                    );
                self.listing
                    .mutate(mutation, self.api.cancel_order(&pending.id, &request))
                    .await
            })
            .await
    }

    pub fn dispose(&self) {
        self.listing.dispose();
    }
}
