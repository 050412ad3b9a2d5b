use magictimer_core::{TimerDuration, PRESETS};

pub fn presets() -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&PRESETS)?;
    println!("{json}");
    Ok(())
}

/// Print the duration, in minutes, after stepping `minutes` by `delta`.
pub fn adjust(minutes: u32, delta: i32) -> Result<(), Box<dyn std::error::Error>> {
    let duration = TimerDuration::from_minutes(minutes)?;
    println!("{}", duration.adjust_minutes(delta).minutes());
    Ok(())
}
