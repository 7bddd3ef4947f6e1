//! Submission handler
//!
//! `submit` runs on the caller's side up to and including the pending
//! indicator; the network call and the final display write happen on a
//! spawned task.

use crate::display::{DisplayUpdate, SubmissionId};
use futures::FutureExt;
use hearth_core::{DisplayState, FormInput, PredictionOutcome, PredictionRequest, ResubmitPolicy};
use hearth_predict::Predictor;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use tokio::task::{AbortHandle, JoinHandle};

/// Display writes buffered per transition receiver before it lags.
pub const TRANSITION_BUFFER: usize = 256;

/// Turns form submissions into display updates.
pub struct Submitter {
    predictor: Arc<dyn Predictor>,
    policy: ResubmitPolicy,
    /// Single-slot display
    display: Arc<watch::Sender<DisplayUpdate>>,
    /// Every display write, in the order it hit the slot
    events: broadcast::Sender<DisplayUpdate>,
    /// Bumped on every submission; the newest submission holds the latest value
    generation: Arc<AtomicU64>,
    /// Abort handle of the newest submission (cancel-on-resubmit only)
    in_flight: Mutex<Option<AbortHandle>>,
}

impl Submitter {
    pub fn new(predictor: Arc<dyn Predictor>, policy: ResubmitPolicy) -> Self {
        let (display, _) = watch::channel(DisplayUpdate::idle());
        let (events, _) = broadcast::channel(TRANSITION_BUFFER);
        Self {
            predictor,
            policy,
            display: Arc::new(display),
            events,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> ResubmitPolicy {
        self.policy
    }

    /// Watch the display. The receiver starts at the current contents.
    pub fn subscribe(&self) -> watch::Receiver<DisplayUpdate> {
        self.display.subscribe()
    }

    /// Receive every display write made after this call, including ones the
    /// watch slot would coalesce. Closes once the submitter and all of its
    /// submissions are gone.
    pub fn transitions(&self) -> broadcast::Receiver<DisplayUpdate> {
        self.events.subscribe()
    }

    pub fn current(&self) -> DisplayUpdate {
        self.display.borrow().clone()
    }

    /// Start a submission.
    ///
    /// The display reads `Calculating...` by the time this returns. Must be
    /// called from within a tokio runtime.
    pub fn submit(&self, form: &FormInput) -> Submission {
        let mut in_flight = self.lock_in_flight();

        let id = SubmissionId::new();
        let request = form.to_request();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if self.policy == ResubmitPolicy::CancelOnResubmit {
            if let Some(previous) = in_flight.take() {
                previous.abort();
                tracing::debug!(submission = %id, "aborted in-flight submission");
            }
        }

        let pending = DisplayUpdate::new(DisplayState::Pending, id);
        self.display.send_modify(|current| {
            *current = pending.clone();
            let _ = self.events.send(pending);
        });
        tracing::info!(submission = %id, policy = %self.policy, "submission pending");

        let predictor = Arc::clone(&self.predictor);
        let display = Arc::clone(&self.display);
        let events = self.events.clone();
        let latest = Arc::clone(&self.generation);
        let policy = self.policy;

        let handle = tokio::spawn(async move {
            let state = resolve(predictor.as_ref(), &request).await;

            let written = display.send_if_modified(|current| {
                if policy == ResubmitPolicy::CancelOnResubmit
                    && latest.load(Ordering::SeqCst) != generation
                {
                    return false;
                }
                *current = DisplayUpdate::new(state.clone(), id);
                let _ = events.send(current.clone());
                true
            });

            if written {
                tracing::info!(submission = %id, phase = ?state.phase(), "submission settled");
            } else {
                tracing::debug!(submission = %id, "superseded, result dropped");
            }
            state
        });

        if self.policy == ResubmitPolicy::CancelOnResubmit {
            *in_flight = Some(handle.abort_handle());
        }

        Submission { id, handle }
    }

    /// Submit and wait for this submission to settle, returning what the
    /// display shows afterwards.
    pub async fn submit_and_wait(&self, form: &FormInput) -> DisplayState {
        self.submit(form).settled().await;
        self.current().state
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One in-progress submission.
pub struct Submission {
    id: SubmissionId,
    handle: JoinHandle<DisplayState>,
}

impl Submission {
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    /// The state this submission settled on, or `None` if a newer submission
    /// aborted it.
    ///
    /// Under cancel-on-resubmit a submission that finished after being
    /// superseded still reports its state here, but never reached the display.
    pub async fn settled(self) -> Option<DisplayState> {
        match self.handle.await {
            Ok(state) => Some(state),
            Err(err) if err.is_cancelled() => None,
            Err(err) => {
                tracing::error!(submission = %self.id, error = %err, "submission task failed");
                None
            }
        }
    }
}

/// Run the prediction and map every outcome, including a panicking
/// predictor, to a settled display state.
///
/// Panics are only caught where they unwind. Under `panic = "abort"` (the
/// workspace release profile) a panicking predictor ends the process.
async fn resolve(predictor: &dyn Predictor, request: &PredictionRequest) -> DisplayState {
    let result = AssertUnwindSafe(predictor.predict(request))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(PredictionOutcome::Estimate { price })) => DisplayState::Estimate { price },
        Ok(Ok(PredictionOutcome::Rejected { status, message })) => {
            tracing::info!(?status, %message, "prediction rejected by server");
            DisplayState::Rejected { message }
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "prediction request failed");
            DisplayState::ConnectionError {
                description: err.to_string(),
            }
        }
        Err(panic) => {
            let description = panic_message(panic.as_ref());
            tracing::error!(%description, "predictor panicked");
            DisplayState::ConnectionError { description }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "prediction task panicked".to_string()
    }
}
