//! PSF2 font parsing.

use crate::error::LoadError;
use crate::mock::PsfImage;
use crate::psf::{self, PsfFont, PSF2_MAGIC};

#[test]
fn test_font_header_fields() {
    let file = PsfImage::patterned(8, 16, 256).build();
    let font = PsfFont::parse(&file).unwrap();
    let header = font.header();

    assert_eq!(header.magic, PSF2_MAGIC);
    assert_eq!(header.header_size, 32);
    assert_eq!(header.length, 256);
    assert_eq!(header.char_size, 16);
    assert_eq!(header.width, 8);
    assert_eq!(header.height, 16);
    assert_eq!(header.glyph_data_len(), 256 * 16);
}

#[test]
fn test_glyph_data_follows_header() {
    let image = PsfImage::patterned(8, 8, 4);
    let file = image.build();
    let font = PsfFont::parse(&file).unwrap();
    assert_eq!(font.glyph_data(), &image.glyphs[..]);
}

#[test]
fn test_wide_glyphs_use_two_bytes_per_row() {
    let file = PsfImage::blank(10, 20, 2).build();
    let font = PsfFont::parse(&file).unwrap();
    assert_eq!(font.header().char_size, 40);
    assert_eq!(font.glyph_data().len(), 80);
}

#[test]
fn test_bad_magic_rejected() {
    for i in 0..4 {
        let mut file = PsfImage::blank(8, 8, 1).build();
        file[i] = file[i].wrapping_add(1);
        assert_eq!(psf::parse_header(&file), Err(LoadError::BadFontMagic), "byte {}", i);
    }
}

#[test]
fn test_psf1_magic_rejected() {
    let mut file = PsfImage::blank(8, 8, 1).build();
    file[..2].copy_from_slice(&[0x36, 0x04]);
    assert!(matches!(PsfFont::parse(&file), Err(LoadError::BadFontMagic)));
}

#[test]
fn test_short_header_is_truncated() {
    let file = PsfImage::blank(8, 8, 1).build();
    assert!(matches!(
        psf::parse_header(&file[..31]),
        Err(LoadError::Truncated {
            what: "PSF2 header",
            needed: 32,
            available: 31,
        })
    ));
}

#[test]
fn test_glyph_table_past_end_is_truncated() {
    let file = PsfImage::blank(8, 16, 256).build();
    let cut = &file[..file.len() - 1];
    assert!(matches!(
        PsfFont::parse(cut),
        Err(LoadError::Truncated {
            what: "PSF2 glyph table",
            ..
        })
    ));
}

#[test]
fn test_header_size_moves_glyph_table() {
    let image = PsfImage::patterned(8, 1, 2);
    let mut header = image.header();
    header.header_size = 40;
    let mut file = crate::mock::images::struct_bytes(&header).to_vec();
    file.extend_from_slice(&[0xEE; 8]);
    file.extend_from_slice(&image.glyphs);

    let font = PsfFont::parse(&file).unwrap();
    assert_eq!(font.glyph_data(), &image.glyphs[..]);
}
