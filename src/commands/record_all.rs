//! Record several microphones at the same time.

use super::Context;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Records every microphone in `mic_ids` concurrently.
///
/// With no ids given, every microphone matched by discovery is recorded.
/// Prints one line per microphone; a failed microphone does not fail the
/// command unless all of them failed.
pub fn handle_record_all(
    ctx: &Context,
    mic_ids: Vec<u32>,
    duration: Option<f64>,
) -> anyhow::Result<BTreeMap<u32, Option<PathBuf>>> {
    let mic_ids = if mic_ids.is_empty() {
        ctx.discover().microphone_ids()
    } else {
        mic_ids
    };

    if mic_ids.is_empty() {
        println!("No USB microphones found to record from.");
        return Ok(BTreeMap::new());
    }

    let duration = ctx.duration(duration);
    println!(
        "Recording from {} microphones for {} seconds...",
        mic_ids.len(),
        duration
    );

    let results = ctx
        .coordinator()
        .capture_audio_concurrently(&mic_ids, duration);
    print_results(&results);

    if results.values().all(Option::is_none) {
        anyhow::bail!("All recordings failed; see the log for details");
    }
    Ok(results)
}

fn print_results(results: &BTreeMap<u32, Option<PathBuf>>) {
    for (mic_id, outcome) in results {
        match outcome {
            Some(path) => println!("  Microphone {}: {}", mic_id, path.display()),
            None => println!("  Microphone {}: failed", mic_id),
        }
    }
}
