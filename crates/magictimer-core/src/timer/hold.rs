//! Hold-to-confirm gate.
//!
//! A press only counts once it has been held continuously until the
//! accumulator fills. Releasing early throws the progress away; there is no
//! credit carried between presses.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TimerError;
use crate::scheduler::{Scheduler, TaskControl, TaskHandle};

pub const HOLD_INTERVAL: Duration = Duration::from_millis(20);
pub const HOLD_STEP: u8 = 2;
pub const HOLD_THRESHOLD: u8 = 100;

/// Result of advancing the accumulator by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "percent")]
pub enum HoldStep {
    /// Not pressed; nothing happened.
    Idle,
    /// Still filling.
    Progress(u8),
    /// Threshold reached. The accumulator is already back at zero.
    Confirmed,
}

/// The arithmetic of the gate, free of any timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldAccumulator {
    value: u8,
    pressed: bool,
    step: u8,
    threshold: u8,
}

impl Default for HoldAccumulator {
    fn default() -> Self {
        Self::new(HOLD_STEP, HOLD_THRESHOLD)
    }
}

impl HoldAccumulator {
    pub fn new(step: u8, threshold: u8) -> Self {
        Self {
            value: 0,
            pressed: false,
            step: step.max(1),
            threshold: threshold.clamp(1, 100),
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Begin a hold. Returns `false` if one is already in progress.
    pub fn press(&mut self) -> bool {
        if self.pressed {
            return false;
        }
        self.pressed = true;
        self.value = 0;
        true
    }

    /// End the hold and discard progress. Returns whether a hold was active.
    pub fn release(&mut self) -> bool {
        let was_pressed = self.pressed;
        self.pressed = false;
        self.value = 0;
        was_pressed
    }

    pub fn advance(&mut self) -> HoldStep {
        if !self.pressed {
            return HoldStep::Idle;
        }
        self.value = self.value.saturating_add(self.step);
        if self.value >= self.threshold {
            self.release();
            HoldStep::Confirmed
        } else {
            HoldStep::Progress(self.value)
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    accumulator: HoldAccumulator,
    handle: Option<TaskHandle>,
    /// Bumped on every press so ticks from an earlier press are ignored.
    epoch: u64,
}

/// Binds a [`HoldAccumulator`] to a repeating timer.
pub struct HoldGate {
    scheduler: Arc<dyn Scheduler>,
    interval: Duration,
    state: Arc<Mutex<GateState>>,
}

impl HoldGate {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_settings(scheduler, HOLD_INTERVAL, HoldAccumulator::default())
    }

    pub fn with_settings(
        scheduler: Arc<dyn Scheduler>,
        interval: Duration,
        accumulator: HoldAccumulator,
    ) -> Self {
        Self {
            scheduler,
            interval,
            state: Arc::new(Mutex::new(GateState {
                accumulator,
                handle: None,
                epoch: 0,
            })),
        }
    }

    /// Live accumulator value, 0..=100.
    pub fn progress(&self) -> u8 {
        self.lock().accumulator.value()
    }

    pub fn is_holding(&self) -> bool {
        self.lock().accumulator.is_pressed()
    }

    /// Start accumulating. `on_progress` sees every intermediate value;
    /// `on_confirm` runs once if the hold is kept until the threshold.
    ///
    /// Returns `Ok(false)` without side effects when a hold is already in
    /// progress.
    pub fn press_start<P, C>(&self, mut on_progress: P, on_confirm: C) -> Result<bool, TimerError>
    where
        P: FnMut(u8) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let mut state = self.lock();
        if state.accumulator.is_pressed() {
            return Ok(false);
        }
        let epoch = state.epoch + 1;
        let shared = Arc::clone(&self.state);
        let mut on_confirm = Some(on_confirm);

        let handle = self.scheduler.schedule_repeating(
            self.interval,
            Box::new(move || {
                let step = {
                    let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    if state.epoch != epoch {
                        return TaskControl::Stop;
                    }
                    let step = state.accumulator.advance();
                    if !matches!(step, HoldStep::Progress(_)) {
                        state.handle = None;
                    }
                    step
                };
                match step {
                    HoldStep::Progress(value) => {
                        on_progress(value);
                        TaskControl::Continue
                    }
                    HoldStep::Confirmed => {
                        on_progress(0);
                        if let Some(confirm) = on_confirm.take() {
                            confirm();
                        }
                        TaskControl::Stop
                    }
                    HoldStep::Idle => TaskControl::Stop,
                }
            }),
        )?;

        state.epoch = epoch;
        state.accumulator.press();
        state.handle = Some(handle);
        debug!("hold gesture started");
        Ok(true)
    }

    /// Release the press. Progress is discarded. Returns whether a hold was
    /// in progress.
    pub fn press_end(&self) -> bool {
        let released = self.cancel();
        if released {
            debug!("hold gesture released before confirmation");
        }
        released
    }

    /// Drop any in-flight hold, e.g. when the session resets.
    pub fn reset(&self) {
        self.cancel();
    }

    fn cancel(&self) -> bool {
        let mut state = self.lock();
        state.epoch += 1;
        if let Some(handle) = state.handle.take() {
            self.scheduler.cancel(handle);
        }
        state.accumulator.release()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for HoldGate {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TokioScheduler;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::sleep;

    #[test]
    fn accumulator_fills_in_fifty_steps() {
        let mut acc = HoldAccumulator::default();
        assert_eq!(acc.advance(), HoldStep::Idle);
        assert!(acc.press());
        assert!(!acc.press());
        for i in 1..50u8 {
            assert_eq!(acc.advance(), HoldStep::Progress(i * 2));
        }
        assert_eq!(acc.advance(), HoldStep::Confirmed);
        assert_eq!(acc.value(), 0);
        assert!(!acc.is_pressed());
        assert_eq!(acc.advance(), HoldStep::Idle);
    }

    #[test]
    fn no_partial_credit_across_presses() {
        let mut acc = HoldAccumulator::default();
        acc.press();
        for _ in 0..49 {
            acc.advance();
        }
        assert_eq!(acc.value(), 98);
        assert!(acc.release());
        assert_eq!(acc.value(), 0);
        acc.press();
        assert_eq!(acc.advance(), HoldStep::Progress(2));
    }

    #[test]
    fn release_without_press_reports_nothing() {
        let mut acc = HoldAccumulator::default();
        assert!(!acc.release());
    }

    struct Probe {
        progress: Arc<Mutex<Vec<u8>>>,
        confirms: Arc<AtomicU32>,
    }

    impl Probe {
        fn new() -> Self {
            Self {
                progress: Arc::new(Mutex::new(Vec::new())),
                confirms: Arc::new(AtomicU32::new(0)),
            }
        }

        fn press(&self, gate: &HoldGate) -> bool {
            let progress = Arc::clone(&self.progress);
            let confirms = Arc::clone(&self.confirms);
            gate.press_start(
                move |value| progress.lock().unwrap().push(value),
                move || {
                    confirms.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap()
        }

        fn confirms(&self) -> u32 {
            self.confirms.load(Ordering::SeqCst)
        }

        fn last(&self) -> Option<u8> {
            self.progress.lock().unwrap().last().copied()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn continuous_hold_confirms_once() {
        let gate = HoldGate::new(Arc::new(TokioScheduler::current().unwrap()));
        let probe = Probe::new();
        assert!(probe.press(&gate));
        assert!(!probe.press(&gate));

        sleep(Duration::from_millis(990)).await;
        assert_eq!(probe.last(), Some(98));
        assert_eq!(gate.progress(), 98);
        assert_eq!(probe.confirms(), 0);

        sleep(Duration::from_millis(20)).await;
        assert_eq!(probe.confirms(), 1);
        assert_eq!(gate.progress(), 0);
        assert!(!gate.is_holding());
        assert_eq!(probe.last(), Some(0));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(probe.confirms(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_hold_starts_over() {
        let gate = HoldGate::new(Arc::new(TokioScheduler::current().unwrap()));
        let probe = Probe::new();

        probe.press(&gate);
        sleep(Duration::from_millis(990)).await;
        assert_eq!(gate.progress(), 98);
        assert!(gate.press_end());
        assert_eq!(gate.progress(), 0);
        assert!(!gate.press_end());

        probe.press(&gate);
        sleep(Duration::from_millis(30)).await;
        assert_eq!(gate.progress(), 2);
        assert_eq!(probe.confirms(), 0);

        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(probe.confirms(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_pending_hold() {
        let scheduler = Arc::new(TokioScheduler::current().unwrap());
        let gate = HoldGate::new(scheduler.clone());
        let probe = Probe::new();

        probe.press(&gate);
        sleep(Duration::from_millis(500)).await;
        gate.reset();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(probe.confirms(), 0);
        assert_eq!(gate.progress(), 0);
        assert_eq!(scheduler.active_tasks(), 0);
    }
}
