mod countdown;
mod duration;
mod hold;
mod progress;
mod sampler;

pub use countdown::{elapsed_secs, percent_remaining, remaining_secs, Countdown};
pub use duration::{
    Preset, TimerDuration, DEFAULT_DURATION_SECS, MAX_DURATION_SECS, MIN_DURATION_SECS, PRESETS,
};
pub use hold::{HoldAccumulator, HoldGate, HoldStep, HOLD_INTERVAL, HOLD_STEP, HOLD_THRESHOLD};
pub use progress::{format_clock, DisplayUnit, ProgressView};
pub use sampler::{ProgressSampler, TICK_INTERVAL};
