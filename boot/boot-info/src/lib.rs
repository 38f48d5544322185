#![no_std]

//! Handoff record shared by the Lantern UEFI loader and kernel.
//!
//! The [`HandoffRecord`] is the whole contract between the two halves: the
//! loader fills it in, passes it by value to the kernel entry point and never
//! regains control. Everything it points at (framebuffer, glyph data,
//! initializer arrays) is owned by the kernel from that moment on.

use core::slice;

/// Signature of the kernel entry point called by the loader.
///
/// The record is passed by value using the System V calling convention.
pub type KernelEntryFn = extern "sysv64" fn(HandoffRecord) -> !;

/// Linear 32-bit framebuffer selected by the loader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FramebufferDescriptor {
    /// Physical address of the first pixel.
    pub base: u64,
    /// Pixels between the start of two consecutive scanlines. May be larger
    /// than `horizontal_resolution`; the extra columns are padding.
    pub pixels_per_scan_line: u32,
    /// Visible pixels per scanline.
    pub horizontal_resolution: u32,
    /// Visible scanlines.
    pub vertical_resolution: u32,
}

impl FramebufferDescriptor {
    pub const fn empty() -> Self {
        Self {
            base: 0,
            pixels_per_scan_line: 0,
            horizontal_resolution: 0,
            vertical_resolution: 0,
        }
    }

    /// Returns `true` when the descriptor points at a usable pixel array.
    pub const fn is_valid(&self) -> bool {
        self.base != 0
            && self.horizontal_resolution != 0
            && self.vertical_resolution != 0
            && self.pixels_per_scan_line >= self.horizontal_resolution
    }

    /// Number of `u32` slots backing the framebuffer, padding included.
    pub const fn buffer_len(&self) -> usize {
        self.pixels_per_scan_line as usize * self.vertical_resolution as usize
    }
}

/// PSF2 glyph bitmaps staged in memory by the loader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FontDescriptor {
    /// Physical address of glyph 0.
    pub base: u64,
    /// Number of glyphs available.
    pub glyph_count: u32,
    /// Size of one glyph bitmap in bytes.
    pub bytes_per_glyph: u32,
    /// Glyph height in pixels (rows).
    pub glyph_height: u32,
    /// Glyph width in pixels.
    pub glyph_width: u32,
}

impl FontDescriptor {
    pub const fn empty() -> Self {
        Self {
            base: 0,
            glyph_count: 0,
            bytes_per_glyph: 0,
            glyph_height: 0,
            glyph_width: 0,
        }
    }

    pub const fn is_valid(&self) -> bool {
        self.base != 0 && self.glyph_count != 0 && self.glyph_width != 0 && self.glyph_height != 0
    }

    /// Bytes used by a single glyph row (`ceil(width / 8)`).
    pub const fn bytes_per_row(&self) -> usize {
        (self.glyph_width as usize + 7) / 8
    }

    /// Total size of the glyph table in bytes.
    pub const fn data_len(&self) -> usize {
        self.glyph_count as usize * self.bytes_per_glyph as usize
    }
}

/// Translated addresses of the kernel's `.init_array` / `.fini_array`.
///
/// Both arrays live in loader-allocated pages that are never freed.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InitializerTable {
    /// Physical address of the constructor address array.
    pub ctor_addresses: u64,
    /// Number of constructors, in link order.
    pub ctor_count: u64,
    /// Physical address of the destructor address array.
    pub dtor_addresses: u64,
    /// Number of destructors, in link order.
    pub dtor_count: u64,
}

impl InitializerTable {
    pub const fn empty() -> Self {
        Self {
            ctor_addresses: 0,
            ctor_count: 0,
            dtor_addresses: 0,
            dtor_count: 0,
        }
    }

    /// Returns the constructor addresses.
    ///
    /// # Safety
    ///
    /// `ctor_addresses` must point at `ctor_count` readable `u64` values that
    /// stay alive for the rest of the program.
    pub unsafe fn constructors(&self) -> &'static [u64] {
        unsafe { address_slice(self.ctor_addresses, self.ctor_count) }
    }

    /// Returns the destructor addresses.
    ///
    /// # Safety
    ///
    /// Same contract as [`InitializerTable::constructors`].
    pub unsafe fn destructors(&self) -> &'static [u64] {
        unsafe { address_slice(self.dtor_addresses, self.dtor_count) }
    }
}

unsafe fn address_slice(addr: u64, count: u64) -> &'static [u64] {
    if addr == 0 || count == 0 {
        return &[];
    }
    unsafe { slice::from_raw_parts(addr as *const u64, count as usize) }
}

/// Everything the kernel receives from the loader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HandoffRecord {
    pub framebuffer: FramebufferDescriptor,
    pub font: FontDescriptor,
    pub initializers: InitializerTable,
}
