//! Menu-driven discovery and capture.
//!
//! Discovers devices once, then loops: pick a pair, a duration and an action.

use super::record::{describe, record_pair};
use super::snapshot::snapshot_file;
use super::Context;
use crate::capture::save_png;
use crate::devices::DeviceInventory;
use cliclack::{input, intro, log, outro, select, spinner};
use console::style;

const MIN_DURATION_SECS: u32 = 1;
const MAX_DURATION_SECS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    CaptureImage,
    RecordPair,
    RecordAll,
    Quit,
}

/// Runs the interactive capture menu until the user quits.
pub fn handle_interactive(ctx: &Context) -> anyhow::Result<()> {
    intro(style(" camic ").on_white().black())?;

    let Some(inventory) = discover_with_retry(ctx)? else {
        outro("No USB camera/microphone units are connected.")?;
        return Ok(());
    };

    loop {
        let number = select_pair(&inventory)?;
        let duration = select_duration(ctx)?;

        let action = select("What do you want to do?")
            .item(Action::CaptureImage, "Capture image", "")
            .item(Action::RecordPair, "Record video + audio", "")
            .item(Action::RecordAll, "Record all microphones", "audio only")
            .item(Action::Quit, "Quit", "")
            .interact()?;

        if action == Action::Quit {
            break;
        }
        if let Err(e) = run_action(ctx, &inventory, number, duration, action) {
            tracing::error!("Action failed: {e:#}");
            log::error(format!("{e:#}"))?;
        }
    }

    outro("Done.")?;
    Ok(())
}

/// Discovers devices, searching a second time if no microphone was found.
fn discover_with_retry(ctx: &Context) -> anyhow::Result<Option<DeviceInventory>> {
    let progress = spinner();
    progress.start("Searching for USB cameras and microphones...");

    let mut inventory = ctx.discover();
    if inventory.is_empty() {
        tracing::info!("No microphones found, searching again");
        progress.set_message("No USB microphones found. Searching again...");
        inventory = ctx.discover();
    }

    if inventory.is_empty() {
        progress.error("No USB microphones found");
        return Ok(None);
    }

    progress.stop(format!(
        "Found {} microphone(s), {} camera(s)",
        inventory.microphones.len(),
        inventory.cameras.len()
    ));
    Ok(Some(inventory))
}

fn select_pair(inventory: &DeviceInventory) -> anyhow::Result<usize> {
    let mut prompt = select("Select a device:");
    for (index, pair) in inventory.pairs().iter().enumerate() {
        let number = index + 1;
        prompt = prompt.item(number, format!("Device #{number}: {}", pair.label()), "");
    }
    Ok(prompt.interact()?)
}

fn select_duration(ctx: &Context) -> anyhow::Result<f64> {
    let default = (ctx.config.capture.default_duration_secs.round() as u32)
        .clamp(MIN_DURATION_SECS, MAX_DURATION_SECS);

    let secs: u32 = input(format!(
        "Duration in seconds ({MIN_DURATION_SECS}-{MAX_DURATION_SECS}):"
    ))
    .default_input(&default.to_string())
    .validate(|value: &String| match value.parse::<u32>() {
        Ok(secs) if (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs) => Ok(()),
        _ => Err(format!(
            "Enter a whole number between {MIN_DURATION_SECS} and {MAX_DURATION_SECS}"
        )),
    })
    .interact()?;

    Ok(f64::from(secs))
}

fn run_action(
    ctx: &Context,
    inventory: &DeviceInventory,
    number: usize,
    duration: f64,
    action: Action,
) -> anyhow::Result<()> {
    let coordinator = ctx.coordinator();
    let pair = inventory
        .pair(number)
        .ok_or_else(|| anyhow::anyhow!("Device #{number} is no longer available"))?;

    match action {
        Action::CaptureImage => {
            let Some(camera) = &pair.camera else {
                log::warning("This microphone has no associated camera")?;
                return Ok(());
            };
            let progress = spinner();
            progress.start(format!("Capturing image from camera {}...", camera.id));
            let frame = match coordinator.capture_still_image(camera.id) {
                Ok(frame) => frame,
                Err(e) => {
                    progress.error("Could not capture image");
                    return Err(e.into());
                }
            };
            let path = coordinator.output_path(&snapshot_file(camera.id));
            save_png(&frame, &path)?;
            progress.stop(format!("Image saved to {}", path.display()));
        }
        Action::RecordPair => {
            let progress = spinner();
            match &pair.camera {
                Some(camera) => progress.start(format!(
                    "Recording device #{number} (camera {} + microphone {}) for {duration}s...",
                    camera.id, pair.microphone.id
                )),
                None => progress.start(format!(
                    "Recording audio only from microphone {} for {duration}s...",
                    pair.microphone.id
                )),
            }
            match record_pair(&coordinator, pair, number, duration) {
                Ok(recording) => progress.stop(describe(&recording)),
                Err(e) => {
                    progress.error("Recording failed");
                    return Err(e);
                }
            }
        }
        Action::RecordAll => {
            let mic_ids = inventory.microphone_ids();
            let progress = spinner();
            progress.start(format!(
                "Recording {} microphones for {duration}s...",
                mic_ids.len()
            ));
            let results = coordinator.capture_audio_concurrently(&mic_ids, duration);
            progress.stop("All recordings completed");
            for (mic_id, outcome) in &results {
                match outcome {
                    Some(path) => log::success(format!("Microphone {mic_id}: {}", path.display()))?,
                    None => log::warning(format!("Microphone {mic_id}: failed"))?,
                }
            }
        }
        Action::Quit => {}
    }

    Ok(())
}
