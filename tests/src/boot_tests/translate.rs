//! Address translation.

use proptest::prelude::*;

use crate::address::translate;

#[test]
fn test_translate_moves_by_load_offset() {
    assert_eq!(translate(0x20_0000, 0x40_1234, 0x40_0000), 0x20_1234);
    assert_eq!(translate(0x80_0000, 0x40_0000, 0x40_0000), 0x80_0000);
}

#[test]
fn test_translate_identity_when_loaded_in_place() {
    assert_eq!(translate(0x40_0000, 0x40_5678, 0x40_0000), 0x40_5678);
}

#[test]
fn test_translate_address_below_load_vaddr_wraps() {
    // Not meaningful for a real image, but must not panic.
    assert_eq!(translate(0x1000, 0, 0x2000), 0u64.wrapping_sub(0x1000));
}

proptest! {
    #[test]
    fn prop_translate_preserves_offset_into_segment(
        load_base in 0u64..(1 << 40),
        vaddr in 0u64..(1 << 40),
        offset in 0u64..(1 << 24),
    ) {
        prop_assert_eq!(translate(load_base, vaddr + offset, vaddr), load_base + offset);
    }

    #[test]
    fn prop_translate_invariant_under_uniform_shift(
        load_base in any::<u64>(),
        entry in any::<u64>(),
        vaddr in any::<u64>(),
        shift in any::<u64>(),
    ) {
        prop_assert_eq!(
            translate(load_base, entry.wrapping_add(shift), vaddr.wrapping_add(shift)),
            translate(load_base, entry, vaddr)
        );
    }
}
