//! `.init_array` / `.fini_array` resolution.

use crate::elf::{Elf64Shdr, ElfImage, SHT_FINI_ARRAY, SHT_INIT_ARRAY};
use crate::error::LoadError;
use crate::initializers::{resolve, ResolvedInitializers};
use crate::mock::KernelImage;

const VADDR: u64 = 0x40_0000;
const LOAD_BASE: u64 = 0x7F_0000;

fn array_section(kind: u32, offset: u64, size: u64) -> Elf64Shdr {
    Elf64Shdr {
        sh_type: kind,
        sh_offset: offset,
        sh_size: size,
        sh_entsize: 8,
        ..Default::default()
    }
}

fn slots(values: &[u64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[test]
fn test_24_byte_init_array_yields_three_addresses() {
    let image = slots(&[0x40_0100, 0x40_0200, 0x40_0080]);
    let sections = [array_section(SHT_INIT_ARRAY, 0, 24)];

    let resolved = resolve(&sections, &image, LOAD_BASE, VADDR).unwrap();
    assert_eq!(resolved.constructors, vec![0x7F_0100, 0x7F_0200, 0x7F_0080]);
    assert!(resolved.destructors.is_empty());
}

#[test]
fn test_no_arrays_gives_empty_sequences() {
    let sections = [Elf64Shdr::default(), array_section(1, 0, 64)];
    let resolved = resolve(&sections, &[0u8; 64], LOAD_BASE, VADDR).unwrap();
    assert_eq!(resolved, ResolvedInitializers::default());
    assert!(resolved.is_empty());
    assert_eq!(resolved.len(), 0);
}

#[test]
fn test_fini_array_goes_to_destructors() {
    let mut image = slots(&[0x40_0010]);
    image.extend(slots(&[0x40_0020, 0x40_0030]));
    let sections = [
        array_section(SHT_FINI_ARRAY, 8, 16),
        array_section(SHT_INIT_ARRAY, 0, 8),
    ];

    let resolved = resolve(&sections, &image, LOAD_BASE, VADDR).unwrap();
    assert_eq!(resolved.constructors, vec![0x7F_0010]);
    assert_eq!(resolved.destructors, vec![0x7F_0020, 0x7F_0030]);
    assert_eq!(resolved.len(), 3);
}

#[test]
fn test_multiple_arrays_append_in_section_order() {
    let image = slots(&[0x40_0001, 0x40_0002, 0x40_0003]);
    let sections = [
        array_section(SHT_INIT_ARRAY, 16, 8),
        array_section(SHT_INIT_ARRAY, 0, 16),
    ];
    let resolved = resolve(&sections, &image, VADDR, VADDR).unwrap();
    assert_eq!(resolved.constructors, vec![0x40_0003, 0x40_0001, 0x40_0002]);
}

#[test]
fn test_partial_trailing_slot_ignored() {
    let image = slots(&[0x40_0100, 0x40_0200]);
    let sections = [array_section(SHT_INIT_ARRAY, 0, 12)];
    let resolved = resolve(&sections, &image, LOAD_BASE, VADDR).unwrap();
    assert_eq!(resolved.constructors, vec![0x7F_0100]);
}

#[test]
fn test_array_past_end_is_truncated() {
    let image = slots(&[0x40_0100, 0x40_0200]);
    let sections = [array_section(SHT_INIT_ARRAY, 8, 16)];
    assert_eq!(
        resolve(&sections, &image, LOAD_BASE, VADDR),
        Err(LoadError::Truncated {
            what: ".init_array",
            needed: 24,
            available: 16,
        })
    );
}

#[test]
fn test_resolves_from_built_image() {
    let file = KernelImage::simple(64, 64)
        .with_init_array(&[VADDR + 0x20, VADDR + 0x30])
        .with_fini_array(&[VADDR + 0x38])
        .build();
    let image = ElfImage::parse(&file).unwrap();

    let resolved = resolve(image.section_headers(), image.bytes(), LOAD_BASE, VADDR).unwrap();
    assert_eq!(resolved.constructors, vec![LOAD_BASE + 0x20, LOAD_BASE + 0x30]);
    assert_eq!(resolved.destructors, vec![LOAD_BASE + 0x38]);
}
