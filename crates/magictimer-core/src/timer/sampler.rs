//! Progress sampler.
//!
//! Samples a [`Countdown`] on a fixed cadence for the lifetime of one run,
//! forwards each remaining value and signals completion exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use super::countdown::Countdown;
use crate::clock::Clock;
use crate::error::TimerError;
use crate::scheduler::{Scheduler, TaskControl, TaskHandle};

/// Default sampling cadence.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

struct ActiveRun {
    handle: TaskHandle,
    finished: Arc<AtomicBool>,
}

pub struct ProgressSampler {
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    run: Option<ActiveRun>,
}

impl ProgressSampler {
    pub fn new(scheduler: Arc<dyn Scheduler>, clock: Arc<dyn Clock>) -> Self {
        Self::with_interval(scheduler, clock, TICK_INTERVAL)
    }

    pub fn with_interval(
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            scheduler,
            clock,
            interval,
            run: None,
        }
    }

    /// Whether a run is scheduled and has not completed or been stopped.
    pub fn is_active(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.finished.load(Ordering::Acquire))
    }

    /// Begin sampling `countdown`.
    ///
    /// `on_tick` receives the current remaining value straight away, then
    /// once per interval. Emitted values never increase. `on_complete` runs
    /// once, right after the tick that reports zero.
    ///
    /// # Errors
    /// [`TimerError::SamplerBusy`] while another run is active;
    /// [`TimerError::SchedulingUnavailable`] if no timer can be created, in
    /// which case nothing has been emitted.
    pub fn start<T, C>(
        &mut self,
        countdown: Countdown,
        on_tick: T,
        on_complete: C,
    ) -> Result<(), TimerError>
    where
        T: FnMut(u32) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        if self.is_active() {
            return Err(TimerError::SamplerBusy);
        }
        self.release();

        let initial = countdown.remaining_at(self.clock.now_ms());
        let finished = Arc::new(AtomicBool::new(false));
        let run_finished = Arc::clone(&finished);
        let clock = Arc::clone(&self.clock);
        let on_tick = Arc::new(Mutex::new(on_tick));
        let tick = Arc::clone(&on_tick);
        let mut last = initial;
        let mut on_complete = Some(on_complete);

        let handle = self.scheduler.schedule_repeating(
            self.interval,
            Box::new(move || {
                if run_finished.load(Ordering::Acquire) {
                    return TaskControl::Stop;
                }
                last = last.min(countdown.remaining_at(clock.now_ms()));
                (tick.lock().unwrap_or_else(PoisonError::into_inner))(last);
                if last > 0 {
                    return TaskControl::Continue;
                }
                if !run_finished.swap(true, Ordering::AcqRel) {
                    if let Some(done) = on_complete.take() {
                        done();
                    }
                }
                TaskControl::Stop
            }),
        )?;

        debug!(
            duration_secs = countdown.duration.secs(),
            remaining_secs = initial,
            "progress sampler started"
        );
        self.run = Some(ActiveRun { handle, finished });
        // The scheduled task cannot fire before one interval has passed, so
        // this is always the first emission of the run.
        (on_tick.lock().unwrap_or_else(PoisonError::into_inner))(initial);
        Ok(())
    }

    /// Cancel sampling. Safe to call repeatedly and after completion.
    pub fn stop(&mut self) {
        if self.run.is_some() {
            debug!("progress sampler stopped");
        }
        self.release();
    }

    fn release(&mut self) {
        if let Some(run) = self.run.take() {
            run.finished.store(true, Ordering::Release);
            self.scheduler.cancel(run.handle);
        }
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, MonotonicClock};
    use crate::scheduler::{BoxedTask, RepeatingTask, TokioScheduler};
    use crate::timer::TimerDuration;
    use std::sync::atomic::AtomicU32;
    use tokio::time::sleep;

    type Ticks = Arc<Mutex<Vec<u32>>>;

    fn recorder() -> (Ticks, impl FnMut(u32) + Send + 'static) {
        let ticks: Ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ticks);
        (ticks, move |remaining| sink.lock().unwrap().push(remaining))
    }

    fn counter() -> (Arc<AtomicU32>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let hits = Arc::clone(&count);
        (count, move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn countdown(secs: u32, started_at_ms: u64) -> Countdown {
        Countdown::new(started_at_ms, TimerDuration::from_secs(secs).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn samples_every_second_and_completes_once() {
        let clock = Arc::new(MonotonicClock::new());
        let scheduler = Arc::new(TokioScheduler::current().unwrap());
        let mut sampler = ProgressSampler::new(scheduler.clone(), clock.clone());
        let (ticks, on_tick) = recorder();
        let (completions, on_complete) = counter();

        sampler
            .start(countdown(120, clock.now_ms()), on_tick, on_complete)
            .unwrap();
        assert_eq!(*ticks.lock().unwrap(), vec![120]);

        sleep(Duration::from_millis(60_500)).await;
        assert_eq!(ticks.lock().unwrap().last(), Some(&60));

        sleep(Duration::from_millis(59_000)).await;
        assert_eq!(ticks.lock().unwrap().last(), Some(&1));
        assert_eq!(completions.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(30)).await;
        let ticks = ticks.lock().unwrap().clone();
        assert_eq!(ticks.len(), 121);
        assert_eq!(ticks.last(), Some(&0));
        assert!(ticks.windows(2).all(|pair| pair[0] >= pair[1]));
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(!sampler.is_active());
        assert_eq!(scheduler.active_tasks(), 0);

        sampler.stop();
        sampler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn suspended_host_catches_up_from_the_clock() {
        let clock = Arc::new(ManualClock::new(0));
        let scheduler = Arc::new(TokioScheduler::current().unwrap());
        let mut sampler = ProgressSampler::new(scheduler, clock.clone());
        let (ticks, on_tick) = recorder();
        let (_, on_complete) = counter();

        sampler.start(countdown(120, 0), on_tick, on_complete).unwrap();
        clock.set_ms(90_000);
        sleep(Duration::from_millis(1_100)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![120, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn emissions_never_increase_when_clock_steps_back() {
        let clock = Arc::new(ManualClock::new(0));
        let scheduler = Arc::new(TokioScheduler::current().unwrap());
        let mut sampler = ProgressSampler::new(scheduler, clock.clone());
        let (ticks, on_tick) = recorder();
        let (_, on_complete) = counter();

        sampler.start(countdown(120, 0), on_tick, on_complete).unwrap();
        clock.set_ms(50_000);
        sleep(Duration::from_millis(1_100)).await;
        clock.set_ms(10_000);
        sleep(Duration::from_secs(1)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![120, 70, 70]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_rejected_while_running() {
        let clock = Arc::new(MonotonicClock::new());
        let scheduler = Arc::new(TokioScheduler::current().unwrap());
        let mut sampler = ProgressSampler::new(scheduler.clone(), clock);
        let (_, on_tick) = recorder();
        let (_, on_complete) = counter();
        sampler.start(countdown(60, 0), on_tick, on_complete).unwrap();

        let (second_ticks, on_tick) = recorder();
        let (_, on_complete) = counter();
        assert_eq!(
            sampler.start(countdown(60, 0), on_tick, on_complete),
            Err(TimerError::SamplerBusy)
        );
        assert!(second_ticks.lock().unwrap().is_empty());
        assert_eq!(scheduler.active_tasks(), 1);

        sampler.stop();
        let (_, on_tick) = recorder();
        let (_, on_complete) = counter();
        assert!(sampler.start(countdown(60, 0), on_tick, on_complete).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_suppresses_further_ticks() {
        let clock = Arc::new(MonotonicClock::new());
        let scheduler = Arc::new(TokioScheduler::current().unwrap());
        let mut sampler = ProgressSampler::new(scheduler.clone(), clock);
        let (ticks, on_tick) = recorder();
        let (completions, on_complete) = counter();
        sampler.start(countdown(60, 0), on_tick, on_complete).unwrap();

        sleep(Duration::from_millis(2_500)).await;
        sampler.stop();
        sampler.stop();
        sleep(Duration::from_secs(120)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![60, 59, 58]);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.active_tasks(), 0);
    }

    struct NoTimers;

    impl Scheduler for NoTimers {
        fn schedule_repeating(
            &self,
            _every: Duration,
            _task: RepeatingTask,
        ) -> Result<TaskHandle, TimerError> {
            Err(TimerError::SchedulingUnavailable)
        }

        fn spawn(&self, _task: BoxedTask) -> Result<TaskHandle, TimerError> {
            Err(TimerError::SchedulingUnavailable)
        }

        fn cancel(&self, _handle: TaskHandle) {}
    }

    #[test]
    fn failed_scheduling_leaves_nothing_behind() {
        let mut sampler = ProgressSampler::new(Arc::new(NoTimers), Arc::new(ManualClock::new(0)));
        let (ticks, on_tick) = recorder();
        let (_, on_complete) = counter();

        assert_eq!(
            sampler.start(countdown(60, 0), on_tick, on_complete),
            Err(TimerError::SchedulingUnavailable)
        );
        assert!(ticks.lock().unwrap().is_empty());
        assert!(!sampler.is_active());
    }
}
