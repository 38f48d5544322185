//! Build-time loader configuration.

/// Kernel image, read from the root of the boot volume.
pub const KERNEL_PATH: &str = "LanternOS";
/// PSF2 console font, read from the root of the boot volume.
pub const FONT_PATH: &str = "font.psf";

/// UEFI page size.
pub const PAGE_SIZE: usize = 0x1000;

/// Staged payloads (font, initializer tables) are kept below this address.
pub const MAX_PHYS_ADDR: u64 = 0x0000_FFFF_FFFF;

/// How the console video mode is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoModePolicy {
    /// Largest mode by the joint horizontal/vertical scan.
    Largest,
    /// First mode with exactly this resolution.
    Exact { width: u32, height: u32 },
}

pub const VIDEO_MODE_POLICY: VideoModePolicy = VideoModePolicy::Largest;

/// Wait for a keypress before exiting boot services.
pub const PAUSE_BEFORE_HANDOFF: bool = cfg!(feature = "pause_before_handoff");

/// Pages needed to hold `size` bytes, never zero.
///
/// `None` when that many pages would not fit the address space.
pub fn pages_for(size: u64) -> Option<usize> {
    let pages = usize::try_from(size.div_ceil(PAGE_SIZE as u64).max(1)).ok()?;
    pages.checked_mul(PAGE_SIZE)?;
    Some(pages)
}
