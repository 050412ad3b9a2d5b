//! Completion notifier boundary.
//!
//! When a countdown finishes the host plays a short alert and then speaks the
//! activity's end message. How either is produced is up to the host; the
//! core only sequences the two calls and keeps their failures away from the
//! session.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::NotifierError;

/// Gap between the start of the alert and the spoken message.
pub const ANNOUNCE_DELAY: Duration = Duration::from_millis(1500);

pub type NotifyFuture = Pin<Box<dyn Future<Output = Result<(), NotifierError>> + Send + 'static>>;

/// Sound and speech collaborator.
pub trait CompletionNotifier: Send + Sync {
    /// Short attention-getting sound. Resolves when it has been played.
    fn alert(&self) -> NotifyFuture;

    /// Speak `message` aloud.
    fn announce(&self, message: &str) -> NotifyFuture;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The announcement was attempted (it may have failed and been logged).
    Announced,
    /// The session moved on before the announcement was due.
    Cancelled,
}

/// Alert, wait until `delay` after the alert started, then announce.
///
/// Cancelling `cancel` at any point before the announcement is due
/// suppresses it. Collaborator errors are logged and otherwise ignored.
pub async fn notify_completion(
    notifier: Arc<dyn CompletionNotifier>,
    message: String,
    delay: Duration,
    cancel: CancellationToken,
) -> NotifyOutcome {
    if cancel.is_cancelled() {
        return NotifyOutcome::Cancelled;
    }

    let alert_started = Instant::now();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("completion alert abandoned");
            return NotifyOutcome::Cancelled;
        }
        result = notifier.alert() => {
            if let Err(e) = result {
                warn!(error = %e, "completion alert failed");
            }
        }
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("completion announcement suppressed");
            return NotifyOutcome::Cancelled;
        }
        _ = sleep_until(alert_started + delay) => {}
    }

    if let Err(e) = notifier.announce(&message).await {
        warn!(error = %e, "completion announcement failed");
    }
    NotifyOutcome::Announced
}

/// Notifier for hosts without audio: records both calls in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl CompletionNotifier for LogNotifier {
    fn alert(&self) -> NotifyFuture {
        Box::pin(async {
            info!("timer finished");
            Ok(())
        })
    }

    fn announce(&self, message: &str) -> NotifyFuture {
        let message = message.to_string();
        Box::pin(async move {
            info!(%message, "announcement");
            Ok(())
        })
    }
}
