use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{
    domain::{DishId, PriceTable},
    protocol::DishStat,
};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::{
    catalog::{MenuCatalog, MenuItem},
    error::{BackendError, SubmitError, SyncError, ValidationError},
    transport::RsvpBackend,
    types::{Confirmation, RegistrationDraft},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcilerConfig {
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub prices: PriceTable,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            prices: PriceTable::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied,
    /// A newer mutation landed while this poll was in flight.
    DiscardedStale,
    Inactive,
}

#[derive(Debug, Clone)]
pub enum AvailabilityEvent {
    ItemsUpdated(Arc<Vec<MenuItem>>),
    PollFailed(String),
    SubmissionConfirmed(Confirmation),
}

struct ReconcilerState {
    items: Arc<Vec<MenuItem>>,
    last_applied_seq: u64,
}

/// Owns the live menu view and merges server counts into it.
///
/// Every poll takes a sequence number when it starts and every applied
/// mutation records its own. A poll result older than the last applied
/// mutation is dropped, so a stale snapshot can never undo an optimistic bump.
pub struct AvailabilityReconciler {
    backend: Arc<dyn RsvpBackend>,
    config: ReconcilerConfig,
    state: RwLock<ReconcilerState>,
    next_seq: AtomicU64,
    active: AtomicBool,
    events: broadcast::Sender<AvailabilityEvent>,
}

impl AvailabilityReconciler {
    pub fn new(
        catalog: &MenuCatalog,
        backend: Arc<dyn RsvpBackend>,
        config: ReconcilerConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            backend,
            config,
            state: RwLock::new(ReconcilerState {
                items: Arc::new(catalog.load()),
                last_applied_seq: 0,
            }),
            next_seq: AtomicU64::new(0),
            active: AtomicBool::new(true),
            events,
        })
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AvailabilityEvent> {
        self.events.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Consistent snapshot of every item.
    pub async fn current_state(&self) -> Arc<Vec<MenuItem>> {
        Arc::clone(&self.state.read().await.items)
    }

    pub async fn item(&self, id: DishId) -> Option<MenuItem> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Stops all further mutation. Results still in flight are dropped on arrival.
    pub async fn shutdown(&self) {
        let _guard = self.state.write().await;
        self.active.store(false, Ordering::SeqCst);
        info!("availability: reconciler shut down");
    }

    fn next_sequence(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn emit(&self, event: AvailabilityEvent) {
        let _ = self.events.send(event);
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        let limit = self.config.request_timeout;
        tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| BackendError::Timeout(limit))?
    }

    /// Pulls confirmed counts from the server and replaces the item list.
    ///
    /// On failure the previous list is kept untouched.
    pub async fn poll(&self) -> Result<PollOutcome, SyncError> {
        if !self.is_active() {
            return Ok(PollOutcome::Inactive);
        }
        let seq = self.next_sequence();
        let stats = match self.bounded(self.backend.fetch_stats()).await {
            Ok(stats) => stats,
            Err(err) => {
                if self.is_active() {
                    warn!(seq, error = %err, "availability: poll failed; keeping last known counts");
                    self.emit(AvailabilityEvent::PollFailed(err.to_string()));
                }
                return Err(SyncError::from(err));
            }
        };

        let items = {
            let mut guard = self.state.write().await;
            if !self.is_active() {
                return Ok(PollOutcome::Inactive);
            }
            if seq < guard.last_applied_seq {
                debug!(
                    seq,
                    last_applied = guard.last_applied_seq,
                    "availability: discarding stale poll result"
                );
                return Ok(PollOutcome::DiscardedStale);
            }
            let items = Arc::new(reconcile_items(&guard.items, &stats.dish_stats));
            guard.items = Arc::clone(&items);
            guard.last_applied_seq = seq;
            items
        };
        debug!(seq, dishes = stats.dish_stats.len(), "availability: poll applied");
        self.emit(AvailabilityEvent::ItemsUpdated(items));
        Ok(PollOutcome::Applied)
    }

    async fn validate(&self, draft: &RegistrationDraft) -> Result<MenuItem, ValidationError> {
        let dish_id = draft.selected_dish.ok_or(ValidationError::NoDishSelected)?;
        let item = self
            .item(dish_id)
            .await
            .ok_or(ValidationError::UnknownDish(dish_id))?;
        if !item.available() {
            return Err(ValidationError::DishUnavailable {
                dish: item.name().to_string(),
            });
        }
        if draft.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if draft.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        Ok(item)
    }

    /// Sends a registration and, once the server accepts it, bumps the local
    /// count for the chosen dish before reconciling with a fresh poll.
    ///
    /// Nothing changes locally when this returns an error.
    pub async fn submit(&self, draft: &RegistrationDraft) -> Result<Confirmation, SubmitError> {
        if !self.is_active() {
            return Err(SubmitError::Inactive);
        }
        let item = self.validate(draft).await.map_err(|err| {
            info!(reason = %err, "availability: registration rejected locally");
            err
        })?;
        let request = draft.to_request(item.name());
        info!(
            dish_id = item.id().0,
            dish = %item.name(),
            payment_type = %request.payment_type,
            guests = request.guests,
            "availability: submitting registration"
        );

        let ack = match self.bounded(self.backend.register(&request)).await {
            Ok(ack) => ack,
            Err(err) => {
                warn!(dish = %item.name(), error = %err, "availability: registration failed");
                return Err(SubmitError::Backend(err));
            }
        };

        let optimistic_applied = self.apply_selection(item.id(), &request.name).await;
        let confirmation = Confirmation {
            rsvp_id: ack.rsvp_id,
            dish_id: item.id(),
            dish_name: item.name().to_string(),
            party_type: request.payment_type,
            guests: request.guests,
            amount: request.payment_type.amount(&self.config.prices),
            server_message: ack.message,
            optimistic_applied,
        };
        if optimistic_applied {
            self.emit(AvailabilityEvent::SubmissionConfirmed(confirmation.clone()));
            if let Err(err) = self.poll().await {
                debug!(error = %err, "availability: follow-up poll failed; keeping optimistic count");
            }
        }
        Ok(confirmation)
    }

    async fn apply_selection(&self, dish_id: DishId, selector: &str) -> bool {
        let items = {
            let mut guard = self.state.write().await;
            if !self.is_active() {
                return false;
            }
            let mut items = guard.items.as_ref().clone();
            let Some(item) = items.iter_mut().find(|item| item.id() == dish_id) else {
                return false;
            };
            item.record_selection(selector);
            let items = Arc::new(items);
            guard.items = Arc::clone(&items);
            guard.last_applied_seq = self.next_sequence();
            items
        };
        self.emit(AvailabilityEvent::ItemsUpdated(items));
        true
    }
}

/// Server entries carrying a stable id match on it; the rest match by exact
/// name. The first match wins and unmatched items drop to zero. Capacity and
/// selector history are local and always kept.
pub(crate) fn reconcile_items(current: &[MenuItem], stats: &[DishStat]) -> Vec<MenuItem> {
    current
        .iter()
        .map(|item| {
            let confirmed = stats
                .iter()
                .find(|stat| match stat.dish_id {
                    Some(id) => id == item.id(),
                    None => stat.dish == item.name(),
                })
                .map_or(0, |stat| stat.count);
            item.with_confirmed_count(confirmed)
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
