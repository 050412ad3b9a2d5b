use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Args;
use magictimer_core::{
    format_clock, CompletionNotifier, Event, NotifyFuture, ProgressView, SessionStatus,
    StartRequest, TimerConfig, TimerController,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::debug;

const BAR_WIDTH: usize = 20;

#[derive(Args)]
pub struct RunArgs {
    /// Activity id (see `magictimer activities`)
    #[arg(long, default_value = "tv")]
    activity: String,
    /// Character id (see `magictimer characters`)
    #[arg(long, default_value = "dino")]
    character: String,
    /// Duration in minutes
    #[arg(long, conflicts_with = "seconds")]
    minutes: Option<u32>,
    /// Duration in seconds
    #[arg(long)]
    seconds: Option<u32>,
}

impl RunArgs {
    fn request(&self, config: &TimerConfig) -> StartRequest {
        let duration_secs = match (self.minutes, self.seconds) {
            (Some(minutes), _) => minutes.saturating_mul(60),
            (None, Some(seconds)) => seconds,
            (None, None) => config.default_duration_secs,
        };
        StartRequest {
            duration_secs,
            activity_id: self.activity.clone(),
            character_id: self.character.clone(),
        }
    }
}

/// Rings the terminal bell and prints the end message.
struct TerminalNotifier {
    announced: Arc<Notify>,
}

impl CompletionNotifier for TerminalNotifier {
    fn alert(&self) -> NotifyFuture {
        Box::pin(async {
            print!("\x07");
            let _ = std::io::stdout().flush();
            Ok(())
        })
    }

    fn announce(&self, message: &str) -> NotifyFuture {
        let message = message.to_string();
        let announced = Arc::clone(&self.announced);
        Box::pin(async move {
            println!("{message}");
            announced.notify_one();
            Ok(())
        })
    }
}

pub fn run(args: RunArgs, config: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = TimerConfig::resolve(config)?;
    let request = args.request(&config);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session(request, config))
}

async fn session(request: StartRequest, config: TimerConfig) -> Result<(), Box<dyn Error>> {
    let announced = Arc::new(Notify::new());
    let notifier = Arc::new(TerminalNotifier {
        announced: Arc::clone(&announced),
    });
    let (timer, mut events) = TimerController::with_config(&config, notifier)?;
    timer.start_with(&request)?;
    eprintln!("Hold Ctrl-C to stop the timer; press Enter to let go.");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { return Ok(()) };
                match event {
                    Event::Tick { progress, .. } => println!("{}", render(&progress)),
                    Event::HoldProgress { percent, .. } => {
                        debug!(percent, "hold progress");
                        if percent > 0 && percent % 20 == 0 {
                            eprintln!("stopping... {percent}%");
                        }
                    }
                    Event::StateChanged { snapshot, .. } => match snapshot.status {
                        SessionStatus::Finished => {
                            announced.notified().await;
                            timer.acknowledge();
                            return Ok(());
                        }
                        SessionStatus::Configuring => {
                            println!("Timer stopped.");
                            return Ok(());
                        }
                        SessionStatus::Running | SessionStatus::Paused => {}
                    },
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                if !timer.press_start()? {
                    // Second Ctrl-C while holding, or nothing to stop.
                    return Err("interrupted".into());
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => {
                        if timer.press_end() {
                            eprintln!("let go, timer keeps running");
                        }
                    }
                    _ => stdin_open = false,
                }
            }
        }
    }
}

/// One status line: clock, bar with the marker, big number and cheer.
fn render(progress: &ProgressView) -> String {
    let filled = ((progress.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "{} [{}{}] {} {} {}",
        format_clock(progress.remaining_secs),
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        progress.marker,
        progress.display(),
        progress.cheer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_full_and_empty() {
        let line = render(&ProgressView::at(300, 300, "🦖"));
        assert_eq!(
            line,
            format!("05:00 [{}] 🦖 5 min Aproveite! 🎉", "#".repeat(BAR_WIDTH))
        );

        let line = render(&ProgressView::at(0, 300, "🦖"));
        assert_eq!(
            line,
            format!("00:00 [{}] ✨ 0 seg Quase lá! ⏳", ".".repeat(BAR_WIDTH))
        );
    }

    #[test]
    fn request_prefers_minutes_then_seconds_then_config() {
        let config = TimerConfig::default();
        let args = RunArgs {
            activity: "eat".into(),
            character: "car".into(),
            minutes: Some(2),
            seconds: None,
        };
        assert_eq!(args.request(&config).duration_secs, 120);

        let args = RunArgs {
            minutes: None,
            seconds: Some(90),
            ..args
        };
        assert_eq!(args.request(&config).duration_secs, 90);

        let args = RunArgs {
            seconds: None,
            ..args
        };
        let request = args.request(&config);
        assert_eq!(request.duration_secs, 300);
        assert_eq!(request.activity_id, "eat");
    }
}
