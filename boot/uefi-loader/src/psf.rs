//! PC Screen Font version 2 reader.

use crate::bytes::{self, RawHeader};
use crate::error::LoadError;

pub const PSF2_MAGIC: [u8; 4] = [0x72, 0xB5, 0x4A, 0x86];

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Psf2Header {
    pub magic: [u8; 4],
    pub version: u32,
    /// Offset of the glyph table from the start of the file.
    pub header_size: u32,
    pub flags: u32,
    /// Number of glyphs.
    pub length: u32,
    /// Bytes per glyph.
    pub char_size: u32,
    pub height: u32,
    pub width: u32,
}

// SAFETY: integer-only `repr(C)` layout.
unsafe impl RawHeader for Psf2Header {}

impl Psf2Header {
    pub fn verify(&self) -> Result<(), LoadError> {
        if self.magic != PSF2_MAGIC {
            return Err(LoadError::BadFontMagic);
        }
        Ok(())
    }

    /// Size of the glyph table in bytes.
    pub fn glyph_data_len(&self) -> usize {
        self.char_size as usize * self.length as usize
    }
}

/// Reads and verifies the PSF2 header.
pub fn parse_header(font: &[u8]) -> Result<Psf2Header, LoadError> {
    let header: Psf2Header = bytes::read_struct(font, 0, "PSF2 header")?;
    header.verify()?;
    Ok(header)
}

/// A verified PSF2 font held in memory.
pub struct PsfFont<'a> {
    header: Psf2Header,
    glyphs: &'a [u8],
}

impl<'a> PsfFont<'a> {
    pub fn parse(font: &'a [u8]) -> Result<Self, LoadError> {
        let header = parse_header(font)?;
        let glyphs = bytes::slice_at(
            font,
            header.header_size as usize,
            header.glyph_data_len(),
            "PSF2 glyph table",
        )?;
        Ok(Self { header, glyphs })
    }

    pub fn header(&self) -> &Psf2Header {
        &self.header
    }

    /// The raw glyph table, `length * char_size` bytes.
    pub fn glyph_data(&self) -> &'a [u8] {
        self.glyphs
    }
}
