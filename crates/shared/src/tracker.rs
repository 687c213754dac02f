use std::time::Duration;

use crate::config::TrackerConfig;
use crate::error::SensorError;
use crate::host::{PositionSensor, RetryScheduler, SensorReading, TimerId, WatchId};
use crate::models::Coordinate;

/// Device position tracking with an accuracy-improvement filter.
///
/// ```text
/// Inactive --activate--> Watching
/// Watching --reading (accuracy > threshold) or error--> Watching + retry pending
/// retry pending --timer--> clear watch, new watch (same session)
/// any --deactivate--> Inactive (watch cleared, timer cancelled)
/// ```
///
/// Within one session (activation or refresh) a reading is published only if
/// its accuracy is at least as good as the best seen so far.
pub struct GeolocationTracker<S, T> {
    sensor: S,
    scheduler: T,
    config: TrackerConfig,
    active: bool,
    watch: Option<WatchId>,
    retry: Option<(TimerId, Duration)>,
    best_accuracy: f64,
    position: Option<Coordinate>,
    error: Option<String>,
    refreshing: bool,
    attempts: u32,
    retries_dismissed: bool,
}

impl<S: PositionSensor, T: RetryScheduler> GeolocationTracker<S, T> {
    pub fn new(config: TrackerConfig, sensor: S, scheduler: T) -> Self {
        Self {
            sensor,
            scheduler,
            config,
            active: false,
            watch: None,
            retry: None,
            best_accuracy: f64::INFINITY,
            position: None,
            error: None,
            refreshing: false,
            attempts: 0,
            retries_dismissed: false,
        }
    }

    /// Start the continuous subscription. No-op when already active.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.best_accuracy = f64::INFINITY;
        self.attempts = 0;
        self.retries_dismissed = false;
        tracing::info!("Starting position tracking");
        self.subscribe();
    }

    /// Stop everything synchronously. Later sensor or timer events are ignored.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.cancel_retry();
        if let Some(id) = self.watch.take() {
            self.sensor.clear_watch(id);
        }
        self.refreshing = false;
        tracing::info!("Stopped position tracking");
    }

    /// User-triggered reacquisition: starts a new session.
    pub fn refresh(&mut self) {
        self.active = true;
        self.refreshing = true;
        self.error = None;
        self.best_accuracy = f64::INFINITY;
        self.attempts = 0;
        self.retries_dismissed = false;
        self.cancel_retry();
        tracing::debug!("Refreshing position");
        self.subscribe();
    }

    /// Cancel the pending retry and stop scheduling new ones until the next
    /// `refresh` or activation.
    pub fn dismiss_retries(&mut self) {
        self.cancel_retry();
        self.retries_dismissed = true;
    }

    /// Location permission changed to granted: drop the stale error and ask
    /// again right away. Ignored while inactive.
    pub fn handle_permission_granted(&mut self) {
        if !self.active {
            return;
        }
        tracing::info!("Location permission granted, resubscribing");
        self.error = None;
        self.attempts = 0;
        self.retries_dismissed = false;
        self.cancel_retry();
        self.subscribe();
    }

    /// Feed one sensor fix. Returns whether it was published.
    pub fn handle_reading(&mut self, watch: WatchId, reading: SensorReading) -> bool {
        if !self.is_current(watch) {
            tracing::trace!(?watch, "Ignoring reading from stale watch");
            return false;
        }

        let improved = reading.accuracy <= self.best_accuracy;
        if improved {
            self.best_accuracy = reading.accuracy;
            self.position = Some(reading.coordinate());
            self.refreshing = false;
            tracing::info!(
                lat = reading.lat,
                lng = reading.lng,
                accuracy = reading.accuracy,
                "Published improved position"
            );
        } else {
            tracing::trace!(
                accuracy = reading.accuracy,
                best = self.best_accuracy,
                "Discarded non-improving reading"
            );
        }

        if reading.accuracy > self.config.accuracy_threshold_m {
            tracing::warn!(
                accuracy = reading.accuracy,
                threshold = self.config.accuracy_threshold_m,
                "Low position accuracy, resubscribing"
            );
            self.schedule_retry();
        } else {
            self.attempts = 0;
        }

        improved
    }

    /// Feed one sensor failure.
    pub fn handle_error(&mut self, watch: WatchId, error: SensorError) {
        if !self.is_current(watch) {
            return;
        }
        self.fail(error);
    }

    /// A scheduled timer elapsed. Returns whether it triggered a resubscription.
    pub fn handle_timer(&mut self, timer: TimerId) -> bool {
        match self.retry {
            Some((id, _)) if id == timer && self.active => {}
            _ => return false,
        }
        self.retry = None;
        self.attempts += 1;
        tracing::debug!(attempt = self.attempts, "Resubscribing to position sensor");
        self.subscribe();
        true
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.position
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Delay of the pending resubscription, if any.
    pub fn pending_retry(&self) -> Option<Duration> {
        self.retry.map(|(_, delay)| delay)
    }

    pub fn best_accuracy(&self) -> Option<f64> {
        self.best_accuracy.is_finite().then_some(self.best_accuracy)
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut T {
        &mut self.scheduler
    }

    fn is_current(&self, watch: WatchId) -> bool {
        self.active && self.watch == Some(watch)
    }

    /// Replace any existing subscription with a fresh one so the provider
    /// has to reacquire instead of returning a cached fix.
    fn subscribe(&mut self) {
        if let Some(id) = self.watch.take() {
            self.sensor.clear_watch(id);
        }
        match self.sensor.watch(&self.config.watch_options()) {
            Ok(id) => self.watch = Some(id),
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, error: SensorError) {
        tracing::warn!(error = %error, "Position sensor error");
        self.error = Some(error.user_message());
        self.refreshing = false;
        if error.is_retryable() {
            self.schedule_retry();
        }
    }

    fn schedule_retry(&mut self) {
        if self.retries_dismissed {
            return;
        }
        if let Some(max) = self.config.max_attempts {
            if self.attempts >= max {
                tracing::warn!(attempts = self.attempts, "Giving up on position retries");
                return;
            }
        }
        self.cancel_retry();
        let delay = self.config.retry.delay_for(self.attempts);
        let id = self.scheduler.schedule(delay);
        self.retry = Some((id, delay));
    }

    fn cancel_retry(&mut self) {
        if let Some((id, _)) = self.retry.take() {
            self.scheduler.cancel(id);
        }
    }
}
