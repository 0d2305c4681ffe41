//! Confirmation workflow in front of mutating actions.
//!
//! `Idle → Intent(target) → Confirming → Idle`. Opening stores the target and
//! shows a confirmation surface. Confirming marks the gate busy and runs the
//! action exactly once; further confirms are ignored until it completes.
//! Cancelling from `Intent` returns to `Idle` without running anything.

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Where the gate is in its workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState<T> {
    Idle,
    Intent(T),
    Confirming(T),
}

/// Result of [`ConfirmationGate::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome<O> {
    /// Nothing to confirm, or a confirmation was already running.
    Ignored,
    /// The action ran and returned this.
    Completed(O),
}

impl<O> GateOutcome<O> {
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    #[must_use]
    pub fn completed(self) -> Option<O> {
        match self {
            Self::Ignored => None,
            Self::Completed(output) => Some(output),
        }
    }
}

/// A pending action on one entity, as shown on the confirmation surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending<I, A> {
    pub id: I,
    pub action: A,
    /// What the surface shows about the entity (name, email, order code).
    pub label: String,
}

impl<I, A: fmt::Display> fmt::Display for Pending<I, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.label)
    }
}

struct GateInner<T> {
    state: GateState<T>,
    /// Target shown on the confirmation surface. Stays set after a failed
    /// action so the user can read the error and retry.
    surface: Option<T>,
}

/// Guards one kind of mutating action against accidental or duplicate
/// submission.
pub struct ConfirmationGate<T> {
    inner: Mutex<GateInner<T>>,
}

impl<T: Clone + Send> Default for ConfirmationGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> ConfirmationGate<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(GateInner {
                state: GateState::Idle,
                surface: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter `Intent` for `target`, replacing any earlier intent.
    ///
    /// Returns `false` while a confirmation is running.
    pub fn open(&self, target: T) -> bool {
        let mut inner = self.lock();
        if matches!(inner.state, GateState::Confirming(_)) {
            return false;
        }
        inner.surface = Some(target.clone());
        inner.state = GateState::Intent(target);
        true
    }

    /// Back out without running anything and close the surface.
    ///
    /// Returns `false` while a confirmation is running.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if matches!(inner.state, GateState::Confirming(_)) {
            return false;
        }
        inner.state = GateState::Idle;
        inner.surface = None;
        true
    }

    /// Run `action` on the pending target.
    ///
    /// Only acts from `Intent`. The gate is back in `Idle` once the action
    /// completes; the surface closes on success and stays open on failure.
    /// If the returned future is dropped before the action completes, the
    /// gate also returns to `Idle` with the surface left open.
    pub async fn confirm<O, E, F, Fut>(&self, action: F) -> GateOutcome<Result<O, E>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<O, E>>,
    {
        let target = {
            let mut inner = self.lock();
            match std::mem::replace(&mut inner.state, GateState::Idle) {
                GateState::Intent(target) => {
                    inner.state = GateState::Confirming(target.clone());
                    target
                }
                other => {
                    debug!("Ignoring confirm outside of intent");
                    inner.state = other;
                    return GateOutcome::Ignored;
                }
            }
        };

        let confirming = Confirming { gate: self };
        let result = action(target).await;
        drop(confirming);

        if result.is_ok() {
            self.lock().surface = None;
        }
        GateOutcome::Completed(result)
    }

    /// Whether a confirmation is running (the confirm control is disabled).
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self.lock().state, GateState::Confirming(_))
    }

    /// Whether the confirmation surface is shown.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lock().surface.is_some()
    }

    /// Target shown on the surface, if any.
    #[must_use]
    pub fn target(&self) -> Option<T> {
        self.lock().surface.clone()
    }

    #[must_use]
    pub fn state(&self) -> GateState<T> {
        self.lock().state.clone()
    }
}

/// Puts the gate back in `Idle` when the confirmation ends, including when
/// the confirming future is dropped mid-request.
struct Confirming<'a, T: Clone + Send> {
    gate: &'a ConfirmationGate<T>,
}

impl<T: Clone + Send> Drop for Confirming<'_, T> {
    fn drop(&mut self) {
        self.gate.lock().state = GateState::Idle;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn test_cancel_from_intent_runs_nothing() {
        let gate = ConfirmationGate::new();
        assert!(gate.open("a1"));
        assert_eq!(gate.state(), GateState::Intent("a1"));
        assert!(gate.cancel());
        assert_eq!(gate.state(), GateState::Idle);
        assert!(!gate.is_open());

        let outcome = gate.confirm(|_| async { Ok::<_, ()>(()) }).await;
        assert!(outcome.is_ignored());
    }

    #[tokio::test]
    async fn test_double_confirm_runs_once() {
        let gate = ConfirmationGate::new();
        let calls = AtomicUsize::new(0);
        let (release, held) = oneshot::channel::<()>();
        gate.open("a1");

        let first = gate.confirm(|_| async {
            calls.fetch_add(1, Ordering::SeqCst);
            held.await.ok();
            Ok::<_, ()>("done")
        });
        let second = async {
            tokio::task::yield_now().await;
            assert!(gate.is_busy());
            let outcome = gate
                .confirm(|_| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>("again")
                })
                .await;
            release.send(()).unwrap();
            outcome
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first, GateOutcome::Completed(Ok("done")));
        assert!(second.is_ignored());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(gate.state(), GateState::Idle);
        assert!(!gate.is_open());
    }

    #[tokio::test]
    async fn test_failure_keeps_surface_open() {
        let gate = ConfirmationGate::new();
        gate.open("o1");
        let outcome = gate.confirm(|_| async { Err::<(), _>("rejected") }).await;
        assert_eq!(outcome, GateOutcome::Completed(Err("rejected")));
        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(gate.target(), Some("o1"));

        // Retrying goes back through intent.
        assert!(gate.open("o1"));
        let outcome = gate.confirm(|_| async { Ok::<_, ()>(()) }).await;
        assert_eq!(outcome, GateOutcome::Completed(Ok(())));
        assert!(!gate.is_open());
    }

    #[tokio::test]
    async fn test_dropped_confirm_returns_to_idle() {
        let gate = ConfirmationGate::new();
        let (_release, held) = oneshot::channel::<()>();
        gate.open("a1");

        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            gate.confirm(|_| async {
                held.await.ok();
                Ok::<_, ()>(())
            }),
        )
        .await;
        assert!(outcome.is_err());

        assert!(!gate.is_busy());
        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(gate.target(), Some("a1"));
        assert!(gate.open("a1"));
    }
}
