//! Monthly revenue report (store director).
//!
//! Not a listing: one report per period. Changing the period re-issues the
//! fetch with the same last-issued-wins ordering as the listings.

use std::sync::Arc;

use mapfood_core::UserId;
use mapfood_core::entity::RevenueReport;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::api::{BackendApi, RevenuePeriod};
use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::listing::{FetchOutcome, Sequencer};
use crate::notify::{Notifier, Toast};
use crate::session::CurrentUser;

const KIND: &str = "revenue report";

pub struct RevenueController<B: BackendApi> {
    api: Arc<B>,
    owner: UserId,
    period: RwLock<RevenuePeriod>,
    report: RwLock<Option<RevenueReport>>,
    sequencer: Sequencer,
    notifier: Arc<dyn Notifier>,
    cancel: CancelToken,
}

impl<B: BackendApi> RevenueController<B> {
    #[must_use]
    pub fn new(
        api: Arc<B>,
        user: &CurrentUser,
        period: RevenuePeriod,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            owner: user.id.clone(),
            period: RwLock::new(period),
            report: RwLock::new(None),
            sequencer: Sequencer::new(),
            notifier,
            cancel: CancelToken::new(),
        }
    }

    /// Fetch the report of the current period.
    ///
    /// # Errors
    ///
    /// `Api` when the latest request failed (the held report is kept and an
    /// error toast is emitted), `Cancelled` after [`RevenueController::dispose`].
    pub async fn load(&self) -> Result<FetchOutcome, FetchError> {
        let period = *self.period.read().await;
        self.fetch(period).await
    }

    /// Switch to `period` and fetch it. Selecting the current period is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// See [`RevenueController::load`].
    pub async fn set_period(&self, period: RevenuePeriod) -> Result<FetchOutcome, FetchError> {
        {
            let mut current = self.period.write().await;
            if *current == period {
                return Ok(FetchOutcome::Skipped);
            }
            *current = period;
        }
        self.fetch(period).await
    }

    #[instrument(skip(self), fields(owner_id = %self.owner, period = %period))]
    async fn fetch(&self, period: RevenuePeriod) -> Result<FetchOutcome, FetchError> {
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let settle = self.sequencer.begin();
        let ticket = settle.ticket();
        let result = self.api.owner_revenue(&self.owner, period).await;
        drop(settle);

        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        if !self.sequencer.is_current(ticket) {
            debug!(?ticket, "Discarding stale revenue report");
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(report) => {
                *self.report.write().await = Some(report);
                Ok(FetchOutcome::Applied { total_pages: 1 })
            }
            Err(source) => {
                warn!(error = %source, "Revenue fetch failed");
                self.notifier.notify(Toast::error(format!(
                    "Could not load revenue for {period}: {source}"
                )));
                Err(FetchError::Api { kind: KIND, source })
            }
        }
    }

    /// Last report committed.
    pub async fn report(&self) -> Option<RevenueReport> {
        self.report.read().await.clone()
    }

    pub async fn period(&self) -> RevenuePeriod {
        *self.period.read().await
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.sequencer.is_loading()
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
    }
}
