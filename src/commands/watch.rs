//! Live camera preview in the terminal.

use super::Context;
use crate::ui::TerminalViewer;

/// Shows camera `camera_id` full screen until q, Esc or Ctrl+C.
///
/// # Errors
/// - If the terminal cannot be put in raw mode
/// - If the camera cannot be opened
pub fn handle_watch(ctx: &Context, camera_id: u32) -> anyhow::Result<()> {
    let coordinator = ctx.coordinator();

    let outcome = {
        let mut viewer = TerminalViewer::new()?;
        let outcome = coordinator.watch_live_video(camera_id, &mut viewer);
        viewer.cleanup()?;
        outcome
    };

    let frames = outcome?;
    println!("Live view of camera {camera_id} closed after {frames} frames.");
    Ok(())
}
