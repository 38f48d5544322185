//! Platform services the loader depends on.

use alloc::vec::Vec;

use lantern_boot_info::FramebufferDescriptor;

use crate::error::LoadError;
use crate::video::VideoModeInfo;

/// Boot-time firmware services.
///
/// Every method except [`Firmware::exit_boot_services`] is only valid while
/// boot services are running; the loader never calls anything after exiting.
pub trait Firmware {
    /// Reads a whole file from the root of the boot volume.
    fn read_file(&mut self, name: &'static str) -> Result<Vec<u8>, LoadError>;

    /// Allocates `pages` physically contiguous 4 KiB pages and returns the
    /// base address. With `max_address`, the whole range lies at or below it.
    fn allocate_pages(&mut self, pages: usize, max_address: Option<u64>) -> Result<u64, LoadError>;

    /// Returns pages obtained from [`Firmware::allocate_pages`].
    fn free_pages(&mut self, base: u64, pages: usize);

    /// Lists the modes offered by the graphics output protocol.
    fn video_modes(&mut self) -> Result<Vec<VideoModeInfo>, LoadError>;

    /// Switches to mode `index` and describes the resulting framebuffer.
    fn set_video_mode(&mut self, index: u32) -> Result<FramebufferDescriptor, LoadError>;

    /// Blocks until a key is pressed.
    fn wait_for_key(&mut self);

    /// Captures the memory map and leaves boot services for good.
    fn exit_boot_services(&mut self);
}
