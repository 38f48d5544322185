//! Formatted Output Tests
//!
//! Exercises the kernel's printf engine against an in-memory sink.

use crate::kprintf::{itoa, kprintf_to, Arg, CharSink, MAX_DIGITS};

#[derive(Default)]
struct Capture(Vec<u8>);

impl CharSink for Capture {
    fn put_byte(&mut self, byte: u8) {
        self.0.push(byte);
    }
}

fn render(format: &str, args: &[Arg<'_>]) -> String {
    let mut sink = Capture::default();
    let written = kprintf_to(&mut sink, format.as_bytes(), args);
    assert_eq!(written, sink.0.len(), "returned count for {:?}", format);
    String::from_utf8(sink.0).unwrap()
}

// =========================================================================
// itoa
// =========================================================================

#[test]
fn test_itoa_bases() {
    let mut buf = [0u8; MAX_DIGITS];
    assert_eq!(itoa(0, 10, false, &mut buf), b"0");
    assert_eq!(itoa(1234567890, 10, false, &mut buf), b"1234567890");
    assert_eq!(itoa(255, 16, false, &mut buf), b"ff");
    assert_eq!(itoa(0xBEEF, 16, true, &mut buf), b"BEEF");
    assert_eq!(itoa(8, 8, false, &mut buf), b"10");
    assert_eq!(itoa(5, 2, false, &mut buf), b"101");
}

#[test]
fn test_itoa_largest_values_fit() {
    let mut buf = [0u8; MAX_DIGITS];
    assert_eq!(itoa(u64::MAX, 8, false, &mut buf), b"1777777777777777777777");
    assert_eq!(itoa(u64::MAX, 10, false, &mut buf), b"18446744073709551615");
    assert_eq!(itoa(u64::MAX, 16, false, &mut buf), b"ffffffffffffffff");
}

// =========================================================================
// Literals and %%
// =========================================================================

#[test]
fn test_plain_text_passes_through() {
    assert_eq!(render("hello, kernel\n", &[]), "hello, kernel\n");
}

#[test]
fn test_percent_literal() {
    assert_eq!(render("%%", &[]), "%");
    assert_eq!(render("100%% done", &[]), "100% done");
}

#[test]
fn test_trailing_percent_dropped() {
    assert_eq!(render("abc%", &[]), "abc");
    assert_eq!(render("abc%-08", &[]), "abc");
}

// =========================================================================
// Integers
// =========================================================================

#[test]
fn test_width_pads_with_spaces() {
    assert_eq!(render("%5d", &[42.into()]), "   42");
    assert_eq!(render("%2d", &[12345.into()]), "12345");
}

#[test]
fn test_zero_pad_keeps_sign_first() {
    assert_eq!(render("%05d", &[(-3).into()]), "-0003");
    assert_eq!(render("%05d", &[42.into()]), "00042");
}

#[test]
fn test_left_justify() {
    assert_eq!(render("[%-5d]", &[42.into()]), "[42   ]");
    // '-' wins over '0'.
    assert_eq!(render("[%-05d]", &[(-7).into()]), "[-7   ]");
}

#[test]
fn test_plus_and_space_flags() {
    assert_eq!(render("%+d", &[5.into()]), "+5");
    assert_eq!(render("%+d", &[(-5).into()]), "-5");
    assert_eq!(render("% d", &[5.into()]), " 5");
    assert_eq!(render("%+05d", &[5.into()]), "+0005");
}

#[test]
fn test_precision_sets_minimum_digits() {
    assert_eq!(render("%.3d", &[7.into()]), "007");
    assert_eq!(render("%6.3d", &[(-7).into()]), "  -007");
    // Zero flag is ignored once a precision is given.
    assert_eq!(render("%06.3d", &[7.into()]), "   007");
    assert_eq!(render("%.0d", &[0.into()]), "");
    assert_eq!(render("%3.0d|", &[0.into()]), "   |");
}

#[test]
fn test_signed_extremes() {
    assert_eq!(render("%d", &[i64::MIN.into()]), "-9223372036854775808");
    assert_eq!(render("%i", &[i32::MAX.into()]), "2147483647");
}

#[test]
fn test_unsigned() {
    assert_eq!(render("%u", &[u64::MAX.into()]), "18446744073709551615");
    assert_eq!(render("%u", &[3usize.into()]), "3");
}

#[test]
fn test_hex() {
    assert_eq!(render("%x", &[255.into()]), "ff");
    assert_eq!(render("%X", &[255.into()]), "FF");
    assert_eq!(render("%#x", &[255.into()]), "0xff");
    assert_eq!(render("%#X", &[0xabcu32.into()]), "0XABC");
    assert_eq!(render("%#010x", &[0x1234u32.into()]), "0x00001234");
    assert_eq!(render("%8x|", &[0xbeefu32.into()]), "    beef|");
}

#[test]
fn test_hex_alternate_form_skips_zero() {
    assert_eq!(render("%#x", &[0.into()]), "0");
}

#[test]
fn test_octal() {
    assert_eq!(render("%o", &[8.into()]), "10");
    assert_eq!(render("%#o", &[8.into()]), "010");
    assert_eq!(render("%#o", &[0.into()]), "0");
    assert_eq!(render("%#.4o", &[8.into()]), "0010");
}

#[test]
fn test_negative_as_unsigned_is_twos_complement() {
    assert_eq!(render("%x", &[(-1i32).into()]), "ffffffffffffffff");
}

#[test]
fn test_length_modifiers_ignored() {
    let args: [Arg<'_>; 4] = [1.into(), 2.into(), 3u16.into(), 0x10usize.into()];
    assert_eq!(render("%ld %lld %hu %zx", &args), "1 2 3 10");
}

#[test]
fn test_pointer() {
    let value = 0u32;
    let ptr = &value as *const u32;
    assert_eq!(render("%p", &[ptr.into()]), format!("{:#x}", ptr as usize));
    assert_eq!(render("%p", &[Arg::Ptr(0x1000)]), "0x1000");
}

// =========================================================================
// Characters and strings
// =========================================================================

#[test]
fn test_char() {
    assert_eq!(render("%c%c", &['o'.into(), b'k'.into()]), "ok");
    assert_eq!(render("[%3c]", &['x'.into()]), "[  x]");
    assert_eq!(render("[%-3c]", &['x'.into()]), "[x  ]");
}

#[test]
fn test_non_ascii_char_becomes_question_mark() {
    assert_eq!(render("%c", &['\u{e9}'.into()]), "?");
}

#[test]
fn test_string() {
    assert_eq!(render("%s!", &["kernel".into()]), "kernel!");
    assert_eq!(render("[%8s]", &["abc".into()]), "[     abc]");
    assert_eq!(render("[%-8s]", &["abc".into()]), "[abc     ]");
}

#[test]
fn test_string_stops_at_nul() {
    let bytes: &[u8] = b"boot\0junk";
    assert_eq!(render("%s", &[bytes.into()]), "boot");
}

#[test]
fn test_string_precision_truncates() {
    assert_eq!(render("%.3s", &["lantern".into()]), "lan");
    assert_eq!(render("%.10s", &["os".into()]), "os");
}

#[test]
fn test_non_string_arg_for_s_prints_nothing() {
    assert_eq!(render("[%s]", &[5.into()]), "[]");
}

// =========================================================================
// Argument handling
// =========================================================================

#[test]
fn test_missing_argument_prints_nothing() {
    assert_eq!(render("a%db%sc", &[1.into()]), "a1bc");
}

#[test]
fn test_unknown_specifier_dropped() {
    assert_eq!(render("a%qb", &[]), "ab");
    // It does not consume an argument.
    assert_eq!(render("%q%d", &[9.into()]), "9");
}

#[test]
fn test_state_resets_between_conversions() {
    let args: [Arg<'_>; 4] = [1.into(), 2.into(), 10.into(), 10.into()];
    assert_eq!(render("%-4d|%d|%#x|%x", &args), "1   |2|0xa|a");
}

#[test]
fn test_return_value_counts_bytes() {
    let mut sink = Capture::default();
    let written = kprintf_to(&mut sink, b"%5d%%%s", &[42.into(), "ab".into()]);
    assert_eq!(written, 8);
    assert_eq!(sink.0, b"   42%ab");
}
