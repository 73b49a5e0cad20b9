//! Record a single microphone.

use super::Context;
use std::path::PathBuf;

/// Finds the id of the first matched microphone whose name contains `name`.
pub fn resolve_microphone(ctx: &Context, name: &str) -> anyhow::Result<u32> {
    let inventory = ctx.discover();
    let mic = inventory
        .find_microphone(name)
        .ok_or_else(|| anyhow::anyhow!("No matched microphone name contains '{name}'"))?;
    tracing::info!("Resolved '{}' to microphone {} ({})", name, mic.id, mic.name);
    Ok(mic.id)
}

/// Records `mic_id` for `duration` seconds (or the configured default).
///
/// # Errors
/// - If the microphone is unavailable or has no input channels
/// - If the WAV file cannot be written
pub fn handle_record_audio(
    ctx: &Context,
    mic_id: u32,
    duration: Option<f64>,
    output: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    let duration = ctx.duration(duration);
    println!("Recording from microphone {mic_id} for {duration} seconds...");

    let path = ctx
        .coordinator()
        .capture_audio(mic_id, duration, output.as_deref())?;

    println!("Recording saved to {}", path.display());
    Ok(path)
}
