//! Blocking microphone capture to WAV.

use super::{
    clamp_duration, concurrent_mic_file, single_mic_file, CaptureCoordinator, AUDIO_FORMAT,
};
use crate::backend::{AudioSystem, StreamSpec};
use crate::error::{CaptureError, Result};
use hound::WavWriter;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;

/// Number of blocks read for a duration: ceil(duration * rate / block_size).
///
/// Durations above [`super::MAX_DURATION_SECS`] are capped.
pub fn block_count(duration_secs: f64, spec: &StreamSpec) -> usize {
    if !(duration_secs > 0.0) {
        return 0;
    }
    let duration_secs = clamp_duration(duration_secs);
    (duration_secs * spec.sample_rate as f64 / spec.block_size as f64).ceil() as usize
}

/// Records `duration_secs` from one microphone into a WAV file.
///
/// Acquires its own subsystem handle and stream; both are released before the
/// file is written, on success and on every error path. Overflows are logged
/// and the affected block is kept, so the sample count only depends on the
/// duration.
pub fn record_microphone(
    audio: &dyn AudioSystem,
    mic_id: u32,
    duration_secs: f64,
    output: &Path,
) -> Result<PathBuf> {
    let spec = AUDIO_FORMAT;
    let blocks = block_count(duration_secs, &spec);

    let samples = {
        let session = audio.connect()?;

        let info = session.device_info(mic_id)?;
        if info.input_channels == 0 {
            return Err(CaptureError::microphone(mic_id, "device has no input channels"));
        }

        let mut stream = session.open_input(mic_id, &spec)?;
        tracing::info!(
            "Recording microphone {} ({}) for {}s ({} blocks)",
            mic_id,
            info.name,
            duration_secs,
            blocks
        );

        let mut samples = Vec::with_capacity(blocks.saturating_mul(spec.block_size));
        let mut block = vec![0i16; spec.block_size];
        let mut faults = 0usize;

        for _ in 0..blocks {
            block.fill(0);
            match stream.read_block(&mut block) {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    faults += 1;
                    tracing::warn!("Microphone {}: {}", mic_id, e);
                }
                Err(e) => return Err(e),
            }
            samples.extend_from_slice(&block);
        }

        if faults > 0 {
            tracing::warn!(
                "Microphone {}: {} of {} blocks had stream faults",
                mic_id,
                faults,
                blocks
            );
        }
        tracing::info!("Recording finished for microphone {}", mic_id);
        samples
    };

    write_wav(output, &samples, &spec)?;
    Ok(output.to_path_buf())
}

/// Writes mono 16-bit PCM samples as an uncompressed WAV file in one pass.
pub fn write_wav(path: &Path, samples: &[i16], spec: &StreamSpec) -> Result<()> {
    let wav_spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, wav_spec).map_err(|e| CaptureError::write(path, e))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| CaptureError::write(path, e))?;
    }
    writer.finalize().map_err(|e| CaptureError::write(path, e))?;

    tracing::info!(
        "Audio saved: {} ({} samples at {}Hz)",
        path.display(),
        samples.len(),
        spec.sample_rate
    );
    Ok(())
}

impl CaptureCoordinator<'_> {
    /// Records one microphone. `output` defaults to `grabacion_mic_<id>.wav`
    /// in the output directory.
    pub fn capture_audio(
        &self,
        mic_id: u32,
        duration_secs: f64,
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.output_path(&single_mic_file(mic_id)));
        record_microphone(self.backends.audio.as_ref(), mic_id, duration_secs, &output)
    }

    /// Records several microphones at once, one OS thread per microphone.
    ///
    /// Returns after every capture has finished. A failed capture maps to
    /// `None` and does not affect the others. Duplicate ids are captured once.
    pub fn capture_audio_concurrently(
        &self,
        mic_ids: &[u32],
        duration_secs: f64,
    ) -> BTreeMap<u32, Option<PathBuf>> {
        let mut unique_ids: Vec<u32> = Vec::with_capacity(mic_ids.len());
        for &id in mic_ids {
            if unique_ids.contains(&id) {
                tracing::warn!("Microphone {} requested twice; capturing it once", id);
            } else {
                unique_ids.push(id);
            }
        }

        tracing::info!(
            "Starting simultaneous recording from {} microphones",
            unique_ids.len()
        );

        let audio = self.backends.audio.as_ref();
        let results: Vec<(u32, Option<PathBuf>)> = thread::scope(|scope| {
            let tasks: Vec<_> = unique_ids
                .iter()
                .map(|&mic_id| {
                    let output = self.output_path(&concurrent_mic_file(mic_id));
                    let task = thread::Builder::new()
                        .name(format!("mic-{mic_id}"))
                        .spawn_scoped(scope, move || {
                            record_microphone(audio, mic_id, duration_secs, &output)
                        });
                    (mic_id, task)
                })
                .collect();

            tasks
                .into_iter()
                .map(|(mic_id, task)| {
                    let outcome = match task {
                        Ok(handle) => match handle.join() {
                            Ok(Ok(path)) => Some(path),
                            Ok(Err(e)) => {
                                tracing::warn!("Recording from microphone {} failed: {}", mic_id, e);
                                None
                            }
                            Err(_) => {
                                tracing::error!("Recording thread for microphone {} panicked", mic_id);
                                None
                            }
                        },
                        Err(e) => {
                            tracing::error!("Failed to start recording thread for microphone {}: {}", mic_id, e);
                            None
                        }
                    };
                    (mic_id, outcome)
                })
                .collect()
        });

        tracing::info!("All simultaneous recordings completed");
        results.into_iter().collect()
    }
}
