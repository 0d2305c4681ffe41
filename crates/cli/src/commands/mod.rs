//! Subcommand implementations.

pub mod accounts;
pub mod foods;
pub mod orders;
pub mod profile;
pub mod revenue;
pub mod shops;

use std::io::Write;
use std::sync::Arc;

use mapfood_dashboard::{
    CurrentUser, DashboardConfig, DashboardError, FetchError, GateOutcome, HttpBackend,
    MemoryNotifier, MutationError, MutationOutcome, Notifier, SessionFile, Toast,
};
use thiserror::Error;

/// Errors that end a command with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error("Failed to read confirmation: {0}")]
    Prompt(#[from] std::io::Error),
}

impl From<FetchError> for CommandError {
    fn from(e: FetchError) -> Self {
        Self::Dashboard(e.into())
    }
}

impl From<MutationError> for CommandError {
    fn from(e: MutationError) -> Self {
        Self::Dashboard(e.into())
    }
}

/// Everything a command needs: configuration, backend, notifications.
pub struct Context {
    pub config: DashboardConfig,
    pub api: Arc<HttpBackend>,
    notifier: Arc<MemoryNotifier>,
    assume_yes: bool,
}

impl Context {
    /// # Errors
    ///
    /// Returns `CommandError` if the base URL override is invalid or the HTTP
    /// client cannot be built.
    pub fn new(
        mut config: DashboardConfig,
        api_url: Option<&str>,
        assume_yes: bool,
        notifier: Arc<MemoryNotifier>,
    ) -> Result<Self, CommandError> {
        if let Some(url) = api_url {
            config.api = config.api.with_base_url(url).map_err(DashboardError::from)?;
        }
        let api = HttpBackend::new(&config.api).map_err(DashboardError::from)?;
        tracing::debug!(base_url = %api.base_url(), "Backend client ready");

        Ok(Self {
            config,
            api: Arc::new(api),
            notifier,
            assume_yes,
        })
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.notifier.clone()
    }

    /// The signed-in user. Without one the command fails closed.
    ///
    /// # Errors
    ///
    /// Returns the session error after raising a toast.
    pub fn current_user(&self) -> Result<CurrentUser, CommandError> {
        SessionFile::load(&self.config.session_file).map_err(|e| {
            self.notifier
                .notify(Toast::error(format!("Sign in first: {e}")));
            DashboardError::from(e).into()
        })
    }

    /// Ask `question` on the terminal, or answer yes with `--yes`.
    ///
    /// # Errors
    ///
    /// Returns `Prompt` if stdin cannot be read.
    pub async fn confirm(&self, question: &str) -> Result<bool, CommandError> {
        if self.assume_yes {
            return Ok(true);
        }

        print!("{question} [y/N] ");
        std::io::stdout().flush()?;
        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(std::io::Error::other)??;

        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Turn a gate outcome into the command's result.
fn finish(
    outcome: GateOutcome<Result<MutationOutcome, MutationError>>,
) -> Result<(), CommandError> {
    match outcome.completed() {
        Some(result) => result.map(|_| ()).map_err(Into::into),
        None => {
            tracing::debug!("Nothing to confirm");
            Ok(())
        }
    }
}

/// Footer printed under paged listings.
fn page_footer(page: u32, total_pages: u32, shown: usize) {
    println!("-- page {page}/{total_pages}, {shown} shown");
}
