//! Cancellable scheduled tasks.
//!
//! Every timer the core uses (progress sampling, hold accumulation, the
//! delayed announcement) is created through a [`Scheduler`] and addressed by
//! a [`TaskHandle`], so cancelling on reset is an explicit call.
//!
//! Contract for implementations: neither scheduling nor cancelling may run a
//! task inline. Callers are allowed to hold their own locks while doing
//! either.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::TimerError;

/// Returned by a repeating task after each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskControl {
    Continue,
    Stop,
}

pub type RepeatingTask = Box<dyn FnMut() -> TaskControl + Send + 'static>;
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Identifies one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

pub trait Scheduler: Send + Sync {
    /// Run `task` every `every`, first after one full interval, until it
    /// returns [`TaskControl::Stop`] or is cancelled.
    fn schedule_repeating(
        &self,
        every: Duration,
        task: RepeatingTask,
    ) -> Result<TaskHandle, TimerError>;

    /// Run a one-off asynchronous job.
    fn spawn(&self, task: BoxedTask) -> Result<TaskHandle, TimerError>;

    /// Cancel a task. Unknown or finished handles are ignored.
    fn cancel(&self, handle: TaskHandle);
}

type TaskTable = Arc<Mutex<HashMap<TaskHandle, AbortHandle>>>;

/// [`Scheduler`] backed by a tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    runtime: Handle,
    tasks: TaskTable,
    next_id: AtomicU64,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Bind to the runtime the caller is running on.
    ///
    /// # Errors
    /// [`TimerError::SchedulingUnavailable`] outside a tokio runtime.
    pub fn current() -> Result<Self, TimerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| TimerError::SchedulingUnavailable)
    }

    /// Number of tasks that are scheduled and not yet finished.
    pub fn active_tasks(&self) -> usize {
        lock(&self.tasks).len()
    }

    fn next_handle(&self) -> TaskHandle {
        TaskHandle(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn launch<F>(&self, handle: TaskHandle, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let table = Arc::clone(&self.tasks);
        // Holding the table lock across spawn keeps a fast task from
        // deregistering itself before it is registered.
        let mut tasks = lock(&self.tasks);
        let join = self.runtime.spawn(async move {
            job.await;
            lock(&table).remove(&handle);
        });
        tasks.insert(handle, join.abort_handle());
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(
        &self,
        every: Duration,
        mut task: RepeatingTask,
    ) -> Result<TaskHandle, TimerError> {
        if every.is_zero() {
            return Err(TimerError::SchedulingUnavailable);
        }
        let handle = self.next_handle();
        let first = Instant::now() + every;
        self.launch(handle, async move {
            let mut ticker = time::interval_at(first, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if task() == TaskControl::Stop {
                    break;
                }
            }
        });
        Ok(handle)
    }

    fn spawn(&self, task: BoxedTask) -> Result<TaskHandle, TimerError> {
        let handle = self.next_handle();
        self.launch(handle, task);
        Ok(handle)
    }

    fn cancel(&self, handle: TaskHandle) {
        if let Some(abort) = lock(&self.tasks).remove(&handle) {
            abort.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
