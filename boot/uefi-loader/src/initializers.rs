//! Resolves the kernel's `.init_array` / `.fini_array` into runtime addresses.

use alloc::vec::Vec;

use crate::address::translate;
use crate::bytes;
use crate::elf::{Elf64Shdr, SHT_FINI_ARRAY, SHT_INIT_ARRAY};
use crate::error::LoadError;

/// Width of one array slot.
pub const SLOT_SIZE: usize = 8;

/// Translated constructor and destructor addresses, in link order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedInitializers {
    pub constructors: Vec<u64>,
    pub destructors: Vec<u64>,
}

impl ResolvedInitializers {
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty() && self.destructors.is_empty()
    }

    /// Total number of addresses across both arrays.
    pub fn len(&self) -> usize {
        self.constructors.len() + self.destructors.len()
    }
}

/// Walks `sections` and decodes every init/fini array found in `image`.
///
/// Arrays of the same kind are appended in section order. Slots are read
/// from the file at `sh_offset`; a trailing partial slot is ignored.
pub fn resolve(
    sections: &[Elf64Shdr],
    image: &[u8],
    load_base: u64,
    declared_load_vaddr: u64,
) -> Result<ResolvedInitializers, LoadError> {
    let mut resolved = ResolvedInitializers::default();

    for section in sections {
        let target = match section.sh_type {
            SHT_INIT_ARRAY => &mut resolved.constructors,
            SHT_FINI_ARRAY => &mut resolved.destructors,
            _ => continue,
        };
        let what = if section.sh_type == SHT_INIT_ARRAY {
            ".init_array"
        } else {
            ".fini_array"
        };

        let count = section.sh_size as usize / SLOT_SIZE;
        let start = section.sh_offset as usize;
        bytes::checked_end(image, start, count * SLOT_SIZE, what)?;

        target.reserve(count);
        for slot in 0..count {
            let declared = bytes::read_u64_le(image, start + slot * SLOT_SIZE, what)?;
            target.push(translate(load_base, declared, declared_load_vaddr));
        }
    }

    Ok(resolved)
}
