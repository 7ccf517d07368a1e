//! Background data refresh system
//!
//! Provides automatic polling of detections, device status, and prediction
//! data in the background, using tokio channels to communicate updates to the
//! main application. Polling runs on fixed intervals while the backend is
//! healthy; after a failure the affected resource backs off exponentially
//! (with jitter) until a poll succeeds again.

use std::time::{Duration, Instant};

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::data::{
    DetectionRecord, DetectionsClient, DeviceClient, DeviceStatus, PredictionSummary,
    PredictionsClient, SystemHealth,
};

/// First retry delay after a failed poll
const INITIAL_BACKOFF: Duration = Duration::from_secs(5);

/// Upper bound on the retry delay
const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Messages sent from background refresh to main app
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// The recent-detections log was refreshed
    DetectionsUpdated(Vec<DetectionRecord>),
    /// Device status was refreshed
    StatusUpdated(DeviceStatus),
    /// System health was refreshed
    HealthUpdated(SystemHealth),
    /// Prediction summaries were refreshed
    PredictionsUpdated(Vec<PredictionSummary>),
    /// An error occurred during refresh
    RefreshError(String),
    /// A refresh cycle started
    RefreshStarted,
    /// A refresh cycle completed
    RefreshCompleted,
}

/// Configuration for refresh intervals
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval for detection log refresh
    pub detections_interval: Duration,
    /// Interval for device status + system health refresh
    pub status_interval: Duration,
    /// Interval for prediction summary refresh
    pub predictions_interval: Duration,
    /// Page size for detection log requests
    pub detection_limit: usize,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            detections_interval: Duration::from_secs(10),
            status_interval: Duration::from_secs(30),
            predictions_interval: Duration::from_secs(60),
            detection_limit: 50,
            enabled: true,
        }
    }
}

/// Per-resource poll health: fixed cadence while healthy, exponential
/// backoff with jitter while the backend is failing
struct PollState {
    backoff: ExponentialBackoff,
    /// Ticks before this instant are skipped
    next_allowed: Option<Instant>,
}

impl PollState {
    fn new() -> Self {
        Self {
            backoff: polling_backoff(),
            next_allowed: None,
        }
    }

    /// Whether a tick may poll now
    fn ready(&self) -> bool {
        self.next_allowed.map_or(true, |t| Instant::now() >= t)
    }

    fn record_success(&mut self) {
        self.backoff.reset();
        self.next_allowed = None;
    }

    fn record_failure(&mut self) {
        if let Some(delay) = self.backoff.next_backoff() {
            debug!(delay_ms = delay.as_millis() as u64, "backing off after failed poll");
            self.next_allowed = Some(Instant::now() + delay);
        }
    }
}

/// Backoff policy for failed polls; randomization gives each delay jitter
fn polling_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: INITIAL_BACKOFF,
        initial_interval: INITIAL_BACKOFF,
        max_interval: MAX_BACKOFF,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Handle for controlling the background refresh system
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Creates a new RefreshHandle and spawns the background refresh task
    ///
    /// # Arguments
    /// * `config` - Refresh intervals and detection page size
    /// * `detections` / `device` / `predictions` - Clients to poll; polls are
    ///   forced so each cycle reconciles the cache with the backend
    ///
    /// # Returns
    /// A RefreshHandle that receives updates via the `receiver` channel
    pub fn spawn(
        config: RefreshConfig,
        detections: DetectionsClient,
        device: DeviceClient,
        predictions: PredictionsClient,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut detections_tick = tokio::time::interval(config.detections_interval);
                let mut status_tick = tokio::time::interval(config.status_interval);
                let mut predictions_tick = tokio::time::interval(config.predictions_interval);
                // Skip the first tick of each (immediate); the app does the
                // initial load itself.
                detections_tick.tick().await;
                status_tick.tick().await;
                predictions_tick.tick().await;

                let mut detections_state = PollState::new();
                let mut status_state = PollState::new();
                let mut predictions_state = PollState::new();
                let limit = config.detection_limit;

                loop {
                    tokio::select! {
                        _ = detections_tick.tick() => {
                            if !detections_state.ready() {
                                continue;
                            }
                            let _ = msg_tx.send(RefreshMessage::RefreshStarted).await;
                            match detections.fetch_recent(limit, true).await {
                                Ok(records) => {
                                    detections_state.record_success();
                                    let _ = msg_tx
                                        .send(RefreshMessage::DetectionsUpdated(records))
                                        .await;
                                }
                                Err(e) => {
                                    warn!(error = %e, "detection poll failed");
                                    detections_state.record_failure();
                                    let _ = msg_tx
                                        .send(RefreshMessage::RefreshError(e.to_string()))
                                        .await;
                                }
                            }
                            let _ = msg_tx.send(RefreshMessage::RefreshCompleted).await;
                        }
                        _ = status_tick.tick() => {
                            if !status_state.ready() {
                                continue;
                            }
                            let mut cycle_ok = true;
                            match device.fetch_status(true).await {
                                Ok(status) => {
                                    let _ = msg_tx.send(RefreshMessage::StatusUpdated(status)).await;
                                }
                                Err(e) => {
                                    warn!(error = %e, "status poll failed");
                                    cycle_ok = false;
                                    let _ = msg_tx
                                        .send(RefreshMessage::RefreshError(e.to_string()))
                                        .await;
                                }
                            }
                            match device.fetch_health(true).await {
                                Ok(health) => {
                                    let _ = msg_tx.send(RefreshMessage::HealthUpdated(health)).await;
                                }
                                Err(e) => {
                                    warn!(error = %e, "health poll failed");
                                    cycle_ok = false;
                                    let _ = msg_tx
                                        .send(RefreshMessage::RefreshError(e.to_string()))
                                        .await;
                                }
                            }
                            if cycle_ok {
                                status_state.record_success();
                            } else {
                                status_state.record_failure();
                            }
                        }
                        _ = predictions_tick.tick() => {
                            if !predictions_state.ready() {
                                continue;
                            }
                            match predictions.fetch_summary(true).await {
                                Ok(summaries) => {
                                    predictions_state.record_success();
                                    let _ = msg_tx
                                        .send(RefreshMessage::PredictionsUpdated(summaries))
                                        .await;
                                }
                                Err(e) => {
                                    warn!(error = %e, "prediction poll failed");
                                    predictions_state.record_failure();
                                    let _ = msg_tx
                                        .send(RefreshMessage::RefreshError(e.to_string()))
                                        .await;
                                }
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
