//! Link-time to runtime address translation.
//!
//! The kernel is linked to run at a fixed address but firmware places it
//! wherever free pages happen to be. Every address embedded in the image is
//! moved by the same constant offset. This only holds for an image with a
//! single contiguous loadable segment.

/// Maps `declared_addr` from an image linked at `declared_load_vaddr` to the
/// copy actually placed at `load_base`.
pub const fn translate(load_base: u64, declared_addr: u64, declared_load_vaddr: u64) -> u64 {
    load_base
        .wrapping_add(declared_addr)
        .wrapping_sub(declared_load_vaddr)
}
