//! Timer controller.
//!
//! Owns the [`Session`] and carries out the effects of its transitions:
//! sampling progress, running the hold gate and sequencing the completion
//! notifier. Hosts drive it through method calls and read [`Event`]s from
//! the channel returned at construction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::catalog::Catalog;
use crate::clock::{Clock, MonotonicClock};
use crate::config::TimerConfig;
use crate::error::TimerError;
use crate::events::Event;
use crate::notifier::{notify_completion, CompletionNotifier};
use crate::scheduler::{Scheduler, TaskHandle, TokioScheduler};
use crate::session::{
    Effect, RunId, Session, SessionEvent, SessionSnapshot, SessionStatus, StartRequest,
};
use crate::timer::{Countdown, HoldGate, Preset, ProgressSampler, ProgressView, TimerDuration};

/// No run is being sampled.
const NO_RUN: u64 = 0;

struct PendingNotification {
    cancel: CancellationToken,
    handle: TaskHandle,
}

struct Inner {
    session: Mutex<Session>,
    sampler: Mutex<ProgressSampler>,
    hold: HoldGate,
    notifier: Arc<dyn CompletionNotifier>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    events: UnboundedSender<Event>,
    announce_delay: Duration,
    /// Run whose ticks may still be published.
    sampling_run: Arc<AtomicU64>,
    notification: Mutex<Option<PendingNotification>>,
}

pub struct TimerController {
    inner: Arc<Inner>,
}

impl TimerController {
    /// Controller on the current tokio runtime with default settings.
    ///
    /// # Errors
    /// [`TimerError::SchedulingUnavailable`] outside a tokio runtime.
    pub fn new(
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Result<(Self, UnboundedReceiver<Event>), TimerError> {
        Self::with_config(&TimerConfig::default(), notifier)
    }

    /// # Errors
    /// [`TimerError::SchedulingUnavailable`] outside a tokio runtime.
    pub fn with_config(
        config: &TimerConfig,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Result<(Self, UnboundedReceiver<Event>), TimerError> {
        let scheduler = Arc::new(TokioScheduler::current()?);
        Ok(Self::with_parts(
            config,
            Catalog::default(),
            scheduler,
            Arc::new(MonotonicClock::new()),
            notifier,
        ))
    }

    /// Assemble a controller from explicit collaborators.
    pub fn with_parts(
        config: &TimerConfig,
        catalog: Catalog,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> (Self, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session::with_duration(Arc::new(catalog), config.default_duration());
        let sampler = ProgressSampler::with_interval(
            Arc::clone(&scheduler),
            Arc::clone(&clock),
            config.tick_interval(),
        );
        let hold = HoldGate::with_settings(
            Arc::clone(&scheduler),
            config.hold_interval(),
            config.hold_accumulator(),
        );
        let inner = Inner {
            session: Mutex::new(session),
            sampler: Mutex::new(sampler),
            hold,
            notifier,
            scheduler,
            clock,
            events: tx,
            announce_delay: config.announce_delay(),
            sampling_run: Arc::new(AtomicU64::new(NO_RUN)),
            notification: Mutex::new(None),
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.inner.lock_session().status()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock_session().snapshot()
    }

    pub fn catalog(&self) -> Catalog {
        self.inner.lock_session().catalog().clone()
    }

    /// Current progress while running, read straight from the clock.
    pub fn progress(&self) -> Option<ProgressView> {
        let session = self.inner.lock_session();
        let countdown = session.countdown()?;
        let remaining = countdown.remaining_at(self.inner.clock.now_ms());
        Some(ProgressView::at(
            remaining,
            countdown.duration.secs(),
            &session.character().icon,
        ))
    }

    /// Live hold gesture fill, 0..=100.
    pub fn hold_progress(&self) -> u8 {
        self.inner.hold.progress()
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Returns `Ok(false)` when ignored because a session is under way.
    pub fn select_activity(&self, id: &str) -> Result<bool, TimerError> {
        let mut session = self.inner.lock_session();
        let changed = session.select_activity(id)?;
        self.inner.publish_if(changed, &session);
        Ok(changed)
    }

    pub fn select_character(&self, id: &str) -> Result<bool, TimerError> {
        let mut session = self.inner.lock_session();
        let changed = session.select_character(id)?;
        self.inner.publish_if(changed, &session);
        Ok(changed)
    }

    pub fn adjust_minutes(&self, delta: i32) -> bool {
        let mut session = self.inner.lock_session();
        let changed = session.adjust_minutes(delta);
        self.inner.publish_if(changed, &session);
        changed
    }

    pub fn set_duration(&self, duration: TimerDuration) -> bool {
        let mut session = self.inner.lock_session();
        let changed = session.set_duration(duration);
        self.inner.publish_if(changed, &session);
        changed
    }

    pub fn apply_preset(&self, preset: &Preset) -> bool {
        self.set_duration(preset.duration())
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Start with the current selection. Returns `Ok(false)` if a session
    /// is already running or finished.
    ///
    /// # Errors
    /// [`TimerError::SchedulingUnavailable`] if sampling cannot be
    /// scheduled; the session is left configuring.
    pub fn start(&self) -> Result<bool, TimerError> {
        self.inner.start(None)
    }

    /// Configure and start in one step. Nothing changes if any part of
    /// `request` is invalid.
    pub fn start_with(&self, request: &StartRequest) -> Result<bool, TimerError> {
        self.inner.start(Some(request))
    }

    /// Begin the hold-to-stop gesture. Only meaningful while running.
    pub fn press_start(&self) -> Result<bool, TimerError> {
        self.inner.press_start()
    }

    /// Let go of the hold-to-stop gesture. Progress is discarded.
    pub fn press_end(&self) -> bool {
        self.inner.release_hold()
    }

    /// Leave the finished screen. Suppresses an announcement that is still
    /// pending.
    pub fn acknowledge(&self) -> bool {
        let mut session = self.inner.lock_session();
        let effects = session.apply(SessionEvent::Acknowledge);
        let applied = !effects.is_empty();
        // Acknowledge never schedules anything, so this cannot fail.
        let _ = self.inner.run_effects(&session, effects);
        applied
    }
}

impl Inner {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sampler(&self) -> MutexGuard<'_, ProgressSampler> {
        self.sampler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_notification(&self) -> MutexGuard<'_, Option<PendingNotification>> {
        self.notification
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: Event) {
        // A host that dropped the receiver just stops getting updates.
        let _ = self.events.send(event);
    }

    fn publish_if(&self, changed: bool, session: &Session) {
        if changed {
            self.emit(Event::state_changed(session.snapshot()));
        }
    }

    fn start(self: &Arc<Self>, request: Option<&StartRequest>) -> Result<bool, TimerError> {
        let mut session = self.lock_session();
        if session.status() != SessionStatus::Configuring {
            return Ok(false);
        }
        let previous = session.clone();
        if let Some(request) = request {
            session.configure(request)?;
        }
        let effects = session.apply(SessionEvent::Start {
            now_ms: self.clock.now_ms(),
        });
        if let Err(e) = self.run_effects(&session, effects) {
            *session = previous;
            warn!(error = %e, "session could not start");
            return Err(e);
        }
        info!(
            activity = %session.activity().id,
            duration_secs = session.duration().secs(),
            "session started"
        );
        Ok(true)
    }

    fn press_start(self: &Arc<Self>) -> Result<bool, TimerError> {
        let session = self.lock_session();
        let run = match (session.status(), session.run()) {
            (SessionStatus::Running, Some(run)) => run,
            _ => return Ok(false),
        };
        let progress_events = self.events.clone();
        let weak = Arc::downgrade(self);
        self.hold.press_start(
            move |percent| {
                let _ = progress_events.send(Event::hold_progress(percent));
            },
            move || dispatch(&weak, SessionEvent::HoldConfirmed { run }),
        )
    }

    fn release_hold(&self) -> bool {
        let released = self.hold.press_end();
        if released {
            self.emit(Event::hold_progress(0));
        }
        released
    }

    fn handle(self: &Arc<Self>, event: SessionEvent) {
        let mut session = self.lock_session();
        let effects = session.apply(event);
        if effects.is_empty() {
            trace!(?event, "ignored session event");
            return;
        }
        if let Err(e) = self.run_effects(&session, effects) {
            warn!(error = %e, ?event, "session effect failed");
        }
    }

    /// Carry out transition effects in order. Called with the session lock
    /// held. Only `StartSampler` can fail, and it always comes first.
    fn run_effects(
        self: &Arc<Self>,
        session: &Session,
        effects: Vec<Effect>,
    ) -> Result<(), TimerError> {
        for effect in effects {
            match effect {
                Effect::StartSampler { run, countdown } => {
                    self.start_sampler(run, countdown, session)?;
                }
                Effect::StopSampler => {
                    self.sampling_run.store(NO_RUN, Ordering::Release);
                    self.lock_sampler().stop();
                }
                Effect::CancelHold => {
                    self.release_hold();
                }
                Effect::Notify { run, message } => self.notify(run, message),
                Effect::CancelNotification => {
                    if let Some(pending) = self.lock_notification().take() {
                        pending.cancel.cancel();
                        self.scheduler.cancel(pending.handle);
                        debug!("pending notification cancelled");
                    }
                }
                Effect::StateChanged(snapshot) => {
                    info!(status = ?snapshot.status, "session state changed");
                    self.emit(Event::state_changed(snapshot));
                }
            }
        }
        Ok(())
    }

    fn start_sampler(
        self: &Arc<Self>,
        run: RunId,
        countdown: Countdown,
        session: &Session,
    ) -> Result<(), TimerError> {
        let duration_secs = countdown.duration.secs();
        let icon = session.character().icon.clone();
        let sampling_run = Arc::clone(&self.sampling_run);
        let ticks = self.events.clone();
        let weak = Arc::downgrade(self);

        self.sampling_run.store(run.get(), Ordering::Release);
        let started = self.lock_sampler().start(
            countdown,
            move |remaining| {
                if sampling_run.load(Ordering::Acquire) != run.get() {
                    trace!(run = run.get(), "stale tick dropped");
                    return;
                }
                let view = ProgressView::at(remaining, duration_secs, &icon);
                let _ = ticks.send(Event::tick(remaining, view));
            },
            move || dispatch(&weak, SessionEvent::SamplerCompleted { run }),
        );
        if started.is_err() {
            self.sampling_run.store(NO_RUN, Ordering::Release);
        }
        started
    }

    fn notify(&self, run: RunId, message: String) {
        let cancel = CancellationToken::new();
        let job = notify_completion(
            Arc::clone(&self.notifier),
            message,
            self.announce_delay,
            cancel.clone(),
        );
        match self.scheduler.spawn(Box::pin(async move {
            let outcome = job.await;
            debug!(run = run.get(), ?outcome, "completion notifier finished");
        })) {
            Ok(handle) => {
                if let Some(stale) = self
                    .lock_notification()
                    .replace(PendingNotification { cancel, handle })
                {
                    stale.cancel.cancel();
                }
            }
            Err(e) => warn!(error = %e, "completion notifier could not be scheduled"),
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let pending = self
            .notification
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.cancel.cancel();
        }
    }
}

/// Deliver an event from a timer callback, if the controller still exists.
fn dispatch(inner: &Weak<Inner>, event: SessionEvent) {
    if let Some(inner) = inner.upgrade() {
        inner.handle(event);
    }
}
