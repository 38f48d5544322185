//! Video mode selection.

use crate::config::VideoModePolicy;
use crate::error::LoadError;

/// One mode reported by the firmware graphics protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoModeInfo {
    /// Firmware mode number, passed back to select the mode.
    pub index: u32,
    pub width: u32,
    pub height: u32,
    /// Pixels per scanline.
    pub stride: u32,
    /// `false` for BLT-only modes that expose no framebuffer.
    pub linear: bool,
}

/// Picks a mode according to `policy`.
///
/// `Largest` walks the list once and only moves to a mode that is both wider
/// and taller than the current pick, so the first of several equal modes
/// wins.
pub fn select_video_mode(
    policy: VideoModePolicy,
    modes: &[VideoModeInfo],
) -> Result<VideoModeInfo, LoadError> {
    let chosen = match policy {
        VideoModePolicy::Largest => {
            let mut best: Option<&VideoModeInfo> = None;
            for mode in modes.iter().filter(|mode| mode.linear) {
                let better = match best {
                    None => true,
                    Some(current) => mode.width > current.width && mode.height > current.height,
                };
                if better {
                    best = Some(mode);
                }
            }
            best
        }
        VideoModePolicy::Exact { width, height } => modes
            .iter()
            .find(|mode| mode.linear && mode.width == width && mode.height == height),
    };

    chosen.copied().ok_or(LoadError::NoVideoMode)
}
