//! List discovered microphones, cameras and their pairing.

use super::Context;
use crate::devices::DeviceInventory;
use std::fmt::Write;

/// Runs one discovery pass and prints what was found.
pub fn handle_list_devices(ctx: &Context) -> anyhow::Result<()> {
    let inventory = ctx.discover();
    print!("{}", render_inventory(&inventory));
    Ok(())
}

/// Formats a discovery result for the terminal.
pub fn render_inventory(inventory: &DeviceInventory) -> String {
    let mut out = String::new();

    if inventory.is_empty() {
        let _ = writeln!(out, "No USB microphones found on this system.");
        if !inventory.cameras.is_empty() {
            let _ = writeln!(
                out,
                "{} camera(s) responded, but no microphone name matched the configured patterns.",
                inventory.cameras.len()
            );
        }
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Microphones:");
    for mic in &inventory.microphones {
        let _ = writeln!(out, "  ID: {}", mic.id);
        let _ = writeln!(out, "    Name: {}", mic.name);
        let _ = writeln!(out, "    Pattern: {}", mic.matched_pattern);
        let _ = writeln!(out, "    Input channels: {}", mic.input_channels);
    }

    let _ = writeln!(out);
    if inventory.cameras.is_empty() {
        let _ = writeln!(out, "Cameras: none responded");
    } else {
        let _ = writeln!(out, "Cameras:");
        for camera in &inventory.cameras {
            let _ = writeln!(
                out,
                "  ID: {}  {} @ {:.0} FPS",
                camera.id,
                camera.resolution(),
                camera.fps
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Pairs:");
    for (index, pair) in inventory.pairs().iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, pair.label());
    }
    let _ = writeln!(out);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::backend::fake::{FakeCamera, FakeMic};

    #[test]
    fn test_render_lists_pairs_with_and_without_camera() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(
            vec![
                FakeMic::new("2- USB Camera: Audio"),
                FakeMic::new("Built-in Microphone"),
                FakeMic::new("USB Camera: Audio"),
            ],
            vec![(0, FakeCamera::new(640, 480))],
            dir.path(),
        );

        let text = render_inventory(&ctx.discover());

        assert!(text.contains("Name: USB Camera: Audio"));
        assert!(!text.contains("Built-in Microphone"));
        assert!(text.contains("ID: 0  640x480 @ 30 FPS"));
        assert!(text.contains("1. Mic: USB Camera: Audio + Camera 0"));
        assert!(text.contains("2. Mic: 2- USB Camera: Audio - no camera"));
    }

    #[test]
    fn test_render_empty_inventory() {
        let text = render_inventory(&DeviceInventory::default());
        assert_eq!(text, "No USB microphones found on this system.\n");
    }
}
