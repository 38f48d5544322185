//! Boot sequence: kernel image, font, video mode, then the jump.
//!
//! [`BootLoader::boot`] walks the states in order and stops at the first
//! failure. On success it returns a [`Handoff`], the only value able to
//! enter the kernel.

use alloc::vec::Vec;
use core::fmt;
use core::mem;
use core::ptr;

use lantern_boot_info::{
    FontDescriptor, FramebufferDescriptor, HandoffRecord, InitializerTable, KernelEntryFn,
};

use crate::address::translate;
use crate::config::{self, VideoModePolicy};
use crate::elf::{ElfImage, LoadableSegment};
use crate::error::LoadError;
use crate::firmware::Firmware;
use crate::initializers::{self, ResolvedInitializers};
use crate::psf::PsfFont;
use crate::video;

/// Last step the loader completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Init,
    ImageAcquired,
    SegmentMapped,
    FontAcquired,
    VideoModeChosen,
    Handoff,
}

impl LoaderState {
    pub const fn as_str(self) -> &'static str {
        match self {
            LoaderState::Init => "init",
            LoaderState::ImageAcquired => "image acquired",
            LoaderState::SegmentMapped => "segment mapped",
            LoaderState::FontAcquired => "font acquired",
            LoaderState::VideoModeChosen => "video mode chosen",
            LoaderState::Handoff => "handoff",
        }
    }
}

/// A fatal error together with the state the loader halted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootFailure {
    pub state: LoaderState,
    pub error: LoadError,
}

impl fmt::Display for BootFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boot halted after '{}': {}", self.state.as_str(), self.error)
    }
}

/// A page range taken from firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub base: u64,
    pub pages: usize,
}

/// Pages the loader owns until the kernel takes over.
#[derive(Debug, Default)]
pub struct LoaderAllocations {
    ranges: Vec<PageRange>,
}

impl LoaderAllocations {
    fn track(&mut self, base: u64, pages: usize) {
        self.ranges.push(PageRange { base, pages });
    }

    pub fn ranges(&self) -> &[PageRange] {
        &self.ranges
    }

    /// Gives every range back to firmware. Only valid before boot services
    /// are exited.
    pub fn release<F: Firmware>(self, firmware: &mut F) {
        for range in self.ranges.iter().rev() {
            firmware.free_pages(range.base, range.pages);
        }
    }

    /// Forgets the ranges without freeing them; the kernel owns the memory.
    /// The bookkeeping itself is not dropped either, as the firmware heap is
    /// gone by the time this runs.
    fn leak(self) {
        mem::forget(self.ranges);
    }
}

/// Translated kernel entry point.
///
/// Only the loader can mint one, and only after the image has been copied
/// and its entry address translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelEntry {
    address: u64,
}

impl KernelEntry {
    pub fn address(&self) -> u64 {
        self.address
    }
}

/// Everything needed to start the kernel.
#[derive(Debug)]
pub struct Handoff {
    entry: KernelEntry,
    record: HandoffRecord,
    allocations: LoaderAllocations,
}

impl Handoff {
    pub fn entry(&self) -> KernelEntry {
        self.entry
    }

    pub fn record(&self) -> &HandoffRecord {
        &self.record
    }

    pub fn allocations(&self) -> &LoaderAllocations {
        &self.allocations
    }

    /// Jumps into the kernel. The loader's pages become kernel memory.
    ///
    /// # Safety
    ///
    /// Boot services must already be exited and the image at the entry
    /// address must be the kernel produced by [`BootLoader::boot`].
    pub unsafe fn enter(self) -> ! {
        let Handoff {
            entry,
            record,
            allocations,
        } = self;
        allocations.leak();
        let kernel: KernelEntryFn = unsafe { mem::transmute(entry.address as usize) };
        kernel(record)
    }
}

/// Where the kernel segment ended up.
struct MappedSegment {
    base: u64,
    pages: usize,
    initializers: InitializerTable,
}

pub struct BootLoader<'f, F: Firmware> {
    firmware: &'f mut F,
    state: LoaderState,
    allocations: LoaderAllocations,
    video_mode_policy: VideoModePolicy,
    pause_before_handoff: bool,
}

impl<'f, F: Firmware> BootLoader<'f, F> {
    /// A loader using the build-time configuration.
    pub fn new(firmware: &'f mut F) -> Self {
        Self {
            firmware,
            state: LoaderState::Init,
            allocations: LoaderAllocations::default(),
            video_mode_policy: config::VIDEO_MODE_POLICY,
            pause_before_handoff: config::PAUSE_BEFORE_HANDOFF,
        }
    }

    pub fn with_video_mode_policy(mut self, policy: VideoModePolicy) -> Self {
        self.video_mode_policy = policy;
        self
    }

    pub fn with_pause_before_handoff(mut self, pause: bool) -> Self {
        self.pause_before_handoff = pause;
        self
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// Runs the whole sequence and exits boot services.
    ///
    /// On failure every page taken so far is returned to firmware and boot
    /// services stay up so the caller can report the error.
    pub fn boot(mut self) -> Result<Handoff, BootFailure> {
        match self.run() {
            Ok(handoff) => {
                // File buffers are dropped by now; the heap dies with boot services.
                self.firmware.exit_boot_services();
                Ok(handoff)
            }
            Err(error) => {
                let state = self.state;
                let allocations = mem::take(&mut self.allocations);
                allocations.release(self.firmware);
                Err(BootFailure { state, error })
            }
        }
    }

    fn run(&mut self) -> Result<Handoff, LoadError> {
        let kernel_file = self.firmware.read_file(config::KERNEL_PATH)?;
        let image = ElfImage::parse(&kernel_file)?;
        let segment = self.acquire_image(&image)?;
        let mapped = self.map_segment(&image, &segment)?;
        let font = self.acquire_font()?;
        let framebuffer = self.choose_video_mode()?;
        self.prepare_handoff(&image, &segment, &mapped, font, framebuffer)
    }

    fn acquire_image(&mut self, image: &ElfImage<'_>) -> Result<LoadableSegment, LoadError> {
        let segment = image.first_loadable_segment()?;
        let extra = image.loadable_segment_count().saturating_sub(1);
        if extra > 0 {
            log::warn!(
                "Kernel image has {} additional PT_LOAD segment(s); only the first is loaded",
                extra
            );
        }
        log::info!(
            "Kernel segment: vaddr={:#x} file_size={:#x} mem_size={:#x} entry={:#x}",
            segment.vaddr,
            segment.file_size,
            segment.mem_size,
            image.entry()
        );
        self.state = LoaderState::ImageAcquired;
        Ok(segment)
    }

    fn map_segment(
        &mut self,
        image: &ElfImage<'_>,
        segment: &LoadableSegment,
    ) -> Result<MappedSegment, LoadError> {
        let pages = config::pages_for(segment.mem_size)
            .ok_or(LoadError::Corrupt("segment size overflows the address space"))?;
        let base = self.allocate(pages, None)?;
        log::info!(
            "Allocated {} pages at {:#x} for {} bytes of kernel image",
            pages,
            base,
            segment.mem_size
        );

        let resolved =
            initializers::resolve(image.section_headers(), image.bytes(), base, segment.vaddr)?;
        for (i, ctor) in resolved.constructors.iter().enumerate() {
            log::debug!("constructor[{}] -> {:#x}", i, ctor);
        }
        for (i, dtor) in resolved.destructors.iter().enumerate() {
            log::debug!("destructor[{}] -> {:#x}", i, dtor);
        }
        let initializers = self.stage_initializers(&resolved)?;

        self.state = LoaderState::SegmentMapped;
        Ok(MappedSegment {
            base,
            pages,
            initializers,
        })
    }

    /// Copies both address arrays into one allocation below
    /// [`config::MAX_PHYS_ADDR`], constructors first.
    fn stage_initializers(
        &mut self,
        resolved: &ResolvedInitializers,
    ) -> Result<InitializerTable, LoadError> {
        if resolved.is_empty() {
            return Ok(InitializerTable::empty());
        }

        let size = resolved.len() * initializers::SLOT_SIZE;
        let pages = config::pages_for(size as u64)
            .ok_or(LoadError::Corrupt("initializer table overflows the address space"))?;
        let base = self.allocate(pages, Some(config::MAX_PHYS_ADDR))?;

        let mut encoded = Vec::with_capacity(size);
        for address in resolved.constructors.iter().chain(&resolved.destructors) {
            encoded.extend_from_slice(&address.to_le_bytes());
        }
        // SAFETY: `base` heads `pages` freshly allocated pages, at least `size` bytes.
        unsafe { copy_to_physical(base, &encoded) };

        let ctor_count = resolved.constructors.len() as u64;
        let dtor_count = resolved.destructors.len() as u64;
        log::info!(
            "Staged {} constructor(s) and {} destructor(s) at {:#x}",
            ctor_count,
            dtor_count,
            base
        );

        Ok(InitializerTable {
            ctor_addresses: if ctor_count == 0 { 0 } else { base },
            ctor_count,
            dtor_addresses: if dtor_count == 0 {
                0
            } else {
                base + ctor_count * initializers::SLOT_SIZE as u64
            },
            dtor_count,
        })
    }

    fn acquire_font(&mut self) -> Result<FontDescriptor, LoadError> {
        let font_file = self.firmware.read_file(config::FONT_PATH)?;
        let font = PsfFont::parse(&font_file)?;
        let header = *font.header();
        let glyphs = font.glyph_data();

        let pages = config::pages_for(glyphs.len() as u64)
            .ok_or(LoadError::Corrupt("glyph data overflows the address space"))?;
        let base = self.allocate(pages, Some(config::MAX_PHYS_ADDR))?;
        // SAFETY: fresh allocation of `pages` pages covers `glyphs.len()` bytes.
        unsafe { copy_to_physical(base, glyphs) };
        log::info!(
            "Font: {} glyphs of {}x{} ({} bytes each) at {:#x}, {} pages",
            header.length,
            header.width,
            header.height,
            header.char_size,
            base,
            pages
        );

        self.state = LoaderState::FontAcquired;
        Ok(FontDescriptor {
            base,
            glyph_count: header.length,
            bytes_per_glyph: header.char_size,
            glyph_height: header.height,
            glyph_width: header.width,
        })
    }

    fn choose_video_mode(&mut self) -> Result<FramebufferDescriptor, LoadError> {
        let modes = self.firmware.video_modes()?;
        let mode = video::select_video_mode(self.video_mode_policy, &modes)?;
        log::info!(
            "Selected video mode {}: {}x{} (stride {})",
            mode.index,
            mode.width,
            mode.height,
            mode.stride
        );

        // The text console goes away with the mode switch.
        if self.pause_before_handoff {
            log::info!("Ready to transfer control to kernel. Press any key to continue...");
            self.firmware.wait_for_key();
        }

        let framebuffer = self.firmware.set_video_mode(mode.index)?;
        if !framebuffer.is_valid() {
            return Err(LoadError::NoVideoMode);
        }
        self.state = LoaderState::VideoModeChosen;
        Ok(framebuffer)
    }

    fn prepare_handoff(
        &mut self,
        image: &ElfImage<'_>,
        segment: &LoadableSegment,
        mapped: &MappedSegment,
        font: FontDescriptor,
        framebuffer: FramebufferDescriptor,
    ) -> Result<Handoff, LoadError> {
        // Only the on-disk bytes; the rest of the segment is left as allocated.
        let contents = image.segment_bytes(segment)?;
        // SAFETY: `mapped` covers `mem_size >= file_size` bytes.
        unsafe { copy_to_physical(mapped.base, contents) };

        let entry = KernelEntry {
            address: translate(mapped.base, image.entry(), segment.vaddr),
        };
        log::info!(
            "Copied {} bytes into {} pages; kernel entry at {:#x}",
            contents.len(),
            mapped.pages,
            entry.address
        );

        self.state = LoaderState::Handoff;
        Ok(Handoff {
            entry,
            record: HandoffRecord {
                framebuffer,
                font,
                initializers: mapped.initializers,
            },
            allocations: mem::take(&mut self.allocations),
        })
    }

    fn allocate(&mut self, pages: usize, max_address: Option<u64>) -> Result<u64, LoadError> {
        let base = self.firmware.allocate_pages(pages, max_address)?;
        self.allocations.track(base, pages);
        Ok(base)
    }
}

/// # Safety
///
/// `dest` must be writable for `src.len()` bytes and not overlap `src`.
unsafe fn copy_to_physical(dest: u64, src: &[u8]) {
    unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dest as *mut u8, src.len()) };
}
