//! Server-side payment polling.
//!
//! The storefront client polls `/api/payments/reconcile` itself, but a
//! closed browser tab would otherwise strand an approved payment with no
//! order. The poller re-runs reconciliation every few seconds until the
//! payment reaches a terminal status or the deadline passes.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::AppState;
use crate::reconcile::{reconcile_payment, ReconcileInput};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Give up after ~30 minutes; PIX QR codes expire well before that.
pub const MAX_POLLS: u32 = 360;

/// Handle for one background polling task. The task stops on `stop` or when
/// the handle is dropped.
pub struct PollerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn a poller for one payment. Each tick performs a full reconcile, so
/// the order-creation guard in the reconcile path is what makes repeated
/// approved observations safe.
pub fn spawn_payment_poller(state: AppState, input: ReconcileInput) -> PollerHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let payment_id = input.payment_id.clone();

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        for _ in 0..MAX_POLLS {
            tokio::select! {
                _ = interval.tick() => {}
                changed = stop_rx.changed() => {
                    // An Err means the handle was dropped; stop either way.
                    if changed.is_err() || *stop_rx.borrow() {
                        tracing::debug!("Poller for {} stopped", payment_id);
                        return;
                    }
                }
            }

            match reconcile_payment(&state, &input).await {
                Ok(outcome) => {
                    if outcome.status.is_terminal() {
                        tracing::info!(
                            "Payment {} reached terminal status {}",
                            payment_id,
                            outcome.status.as_str()
                        );
                        return;
                    }
                }
                // Transient gateway or database trouble; next tick retries.
                Err(e) => {
                    tracing::warn!("Reconcile poll for {} failed: {}", payment_id, e);
                }
            }
        }

        tracing::warn!("Poller for {} gave up after {} polls", payment_id, MAX_POLLS);
    });

    PollerHandle { stop_tx, task }
}

/// Register a poller for the payment unless one is already running. Finished
/// handles are pruned on the way in so the map stays bounded by the number of
/// in-flight payments.
pub fn ensure_payment_poller(state: &AppState, input: ReconcileInput) {
    let registry = state.pollers.clone();
    let mut pollers = match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    pollers.retain(|_, handle| !handle.is_finished());

    if pollers.contains_key(&input.payment_id) {
        return;
    }

    let payment_id = input.payment_id.clone();
    let handle = spawn_payment_poller(state.clone(), input);
    pollers.insert(payment_id, handle);
}
