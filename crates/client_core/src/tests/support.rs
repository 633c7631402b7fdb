use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{DishId, RsvpId},
    protocol::{DishStat, RegistrationRequest, StatsPayload},
};
use tokio::sync::oneshot;

use crate::{
    catalog::MenuCatalog,
    error::BackendError,
    reconciler::{AvailabilityReconciler, ReconcilerConfig},
    transport::{RegistrationAck, RsvpBackend},
};

pub(crate) type StatsReply = Result<StatsPayload, BackendError>;

pub(crate) enum StatsStep {
    Reply(StatsReply),
    Gated(oneshot::Receiver<StatsReply>),
    Hang,
}

pub(crate) type RegisterReply = Result<RegistrationAck, BackendError>;

pub(crate) enum RegisterStep {
    Reply(RegisterReply),
    Gated(oneshot::Receiver<RegisterReply>),
    Hang,
}

/// Decrements the in-flight counter even when the call is dropped mid-await.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory backend. Queued steps are served first; once the queue is empty
/// stats reflect every registration it has accepted.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    stats_steps: Mutex<VecDeque<StatsStep>>,
    register_steps: Mutex<VecDeque<RegisterStep>>,
    server_counts: Mutex<Vec<DishStat>>,
    requests: Mutex<Vec<RegistrationRequest>>,
    stats_calls: AtomicUsize,
    stats_in_flight: AtomicUsize,
    max_stats_in_flight: AtomicUsize,
    register_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_stats(&self, step: StatsStep) {
        self.stats_steps.lock().expect("lock").push_back(step);
    }

    /// Queues a stats reply that resolves only when the returned sender fires.
    pub(crate) fn push_gated_stats(&self) -> oneshot::Sender<StatsReply> {
        let (tx, rx) = oneshot::channel();
        self.push_stats(StatsStep::Gated(rx));
        tx
    }

    pub(crate) fn push_register(&self, reply: RegisterReply) {
        self.push_register_step(RegisterStep::Reply(reply));
    }

    pub(crate) fn push_register_step(&self, step: RegisterStep) {
        self.register_steps.lock().expect("lock").push_back(step);
    }

    /// Queues a registration reply that resolves only when the returned sender fires.
    pub(crate) fn push_gated_register(&self) -> oneshot::Sender<RegisterReply> {
        let (tx, rx) = oneshot::channel();
        self.push_register_step(RegisterStep::Gated(rx));
        tx
    }

    pub(crate) fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    /// Highest number of stats requests that were awaiting a reply at once.
    pub(crate) fn max_stats_in_flight(&self) -> usize {
        self.max_stats_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<RegistrationRequest> {
        self.requests.lock().expect("lock").clone()
    }

    fn record_on_server(&self, dish: &str) {
        let mut counts = self.server_counts.lock().expect("lock");
        match counts.iter_mut().find(|stat| stat.dish == dish) {
            Some(stat) => stat.count += 1,
            None => counts.push(DishStat {
                dish: dish.to_string(),
                count: 1,
                dish_id: None,
            }),
        }
    }
}

#[async_trait]
impl RsvpBackend for ScriptedBackend {
    async fn fetch_stats(&self) -> Result<StatsPayload, BackendError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.stats_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_stats_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.stats_in_flight);
        let step = self.stats_steps.lock().expect("lock").pop_front();
        match step {
            Some(StatsStep::Reply(reply)) => reply,
            Some(StatsStep::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(BackendError::Network("gate dropped".into()))),
            Some(StatsStep::Hang) => std::future::pending().await,
            None => Ok(StatsPayload {
                dish_stats: self.server_counts.lock().expect("lock").clone(),
                ..StatsPayload::default()
            }),
        }
    }

    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationAck, BackendError> {
        let call = self.register_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().expect("lock").push(request.clone());
        let step = self.register_steps.lock().expect("lock").pop_front();
        let reply = match step {
            Some(RegisterStep::Reply(reply)) => Some(reply),
            Some(RegisterStep::Gated(rx)) => Some(
                rx.await
                    .unwrap_or_else(|_| Err(BackendError::Network("gate dropped".into()))),
            ),
            Some(RegisterStep::Hang) => std::future::pending().await,
            None => None,
        };
        match reply {
            Some(Err(err)) => Err(err),
            Some(Ok(ack)) => {
                self.record_on_server(&request.selected_dish);
                Ok(ack)
            }
            None => {
                self.record_on_server(&request.selected_dish);
                Ok(RegistrationAck {
                    rsvp_id: Some(RsvpId(call as i64)),
                    message: Some("RSVP created".into()),
                })
            }
        }
    }
}

pub(crate) fn stats(counts: &[(&str, u32)]) -> StatsPayload {
    StatsPayload {
        dish_stats: counts
            .iter()
            .map(|(dish, count)| DishStat {
                dish: dish.to_string(),
                count: *count,
                dish_id: None,
            })
            .collect(),
        ..StatsPayload::default()
    }
}

pub(crate) fn stat_with_id(dish: &str, count: u32, id: i64) -> DishStat {
    DishStat {
        dish: dish.to_string(),
        count,
        dish_id: Some(DishId(id)),
    }
}

pub(crate) fn test_config() -> ReconcilerConfig {
    ReconcilerConfig {
        poll_interval: Duration::from_secs(10),
        request_timeout: Duration::from_millis(500),
        ..ReconcilerConfig::default()
    }
}

pub(crate) fn reconciler_with(
    backend: &Arc<ScriptedBackend>,
    config: ReconcilerConfig,
) -> Arc<AvailabilityReconciler> {
    AvailabilityReconciler::new(&MenuCatalog::default(), backend.clone(), config)
}
