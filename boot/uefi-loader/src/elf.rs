//! ELF64 reader for the kernel image.
//!
//! Only what the loader needs is decoded: the file header, the program
//! header table (to find the loadable segment) and the section header table
//! (to find `.init_array` / `.fini_array`).

use alloc::vec::Vec;
use core::mem;

use crate::bytes::{self, RawHeader};
use crate::error::LoadError;

/// `e_ident[0..4]`
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
/// `e_ident[EI_CLASS]` for 64-bit objects.
pub const ELFCLASS64: u8 = 2;
pub const EI_CLASS: usize = 4;

pub const PT_LOAD: u32 = 1;
pub const SHT_INIT_ARRAY: u32 = 14;
pub const SHT_FINI_ARRAY: u32 = 15;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elf64Ehdr {
    pub e_ident: [u8; 16],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elf64Phdr {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elf64Shdr {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

// SAFETY: integer-only `repr(C)` layouts.
unsafe impl RawHeader for Elf64Ehdr {}
unsafe impl RawHeader for Elf64Phdr {}
unsafe impl RawHeader for Elf64Shdr {}

impl Elf64Ehdr {
    /// Checks the identity bytes: `\x7fELF` followed by the 64-bit class.
    pub fn verify(&self) -> Result<(), LoadError> {
        if self.e_ident[..4] != ELF_MAGIC {
            return Err(LoadError::BadElfMagic);
        }
        if self.e_ident[EI_CLASS] != ELFCLASS64 {
            return Err(LoadError::NotElf64);
        }
        Ok(())
    }
}

/// Reads and verifies the 64-byte file header.
pub fn parse_header(image: &[u8]) -> Result<Elf64Ehdr, LoadError> {
    let header: Elf64Ehdr = bytes::read_struct(image, 0, "ELF header")?;
    header.verify()?;
    Ok(header)
}

/// Reads `count` entries of `entsize` bytes starting at `offset`.
fn read_table<T: RawHeader>(
    image: &[u8],
    offset: u64,
    entsize: u16,
    count: u16,
    what: &'static str,
) -> Result<Vec<T>, LoadError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let entsize = entsize as usize;
    if entsize < mem::size_of::<T>() {
        return Err(LoadError::Corrupt("header table entry size too small"));
    }
    let offset = offset as usize;
    let total = entsize
        .checked_mul(count as usize)
        .ok_or(LoadError::Corrupt("header table size overflows"))?;
    bytes::checked_end(image, offset, total, what)?;

    let mut entries = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        entries.push(bytes::read_struct(image, offset + i * entsize, what)?);
    }
    Ok(entries)
}

/// The part of a `PT_LOAD` program header the loader acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadableSegment {
    /// Offset of the segment's bytes in the file.
    pub offset: u64,
    /// Address the image was linked to run the segment at.
    pub vaddr: u64,
    /// Bytes present in the file.
    pub file_size: u64,
    /// Bytes the segment occupies in memory; the tail past `file_size` is
    /// uninitialized data.
    pub mem_size: u64,
}

impl LoadableSegment {
    fn from_header(ph: &Elf64Phdr) -> Result<Self, LoadError> {
        if ph.p_memsz < ph.p_filesz {
            return Err(LoadError::Corrupt("segment memory size smaller than file size"));
        }
        Ok(Self {
            offset: ph.p_offset,
            vaddr: ph.p_vaddr,
            file_size: ph.p_filesz,
            mem_size: ph.p_memsz,
        })
    }
}

/// A verified ELF64 file held in memory.
pub struct ElfImage<'a> {
    bytes: &'a [u8],
    header: Elf64Ehdr,
    program_headers: Vec<Elf64Phdr>,
    section_headers: Vec<Elf64Shdr>,
}

impl<'a> ElfImage<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, LoadError> {
        let header = parse_header(bytes)?;
        let program_headers = read_table(
            bytes,
            header.e_phoff,
            header.e_phentsize,
            header.e_phnum,
            "program header table",
        )?;
        let section_headers = if header.e_shoff == 0 {
            Vec::new()
        } else {
            read_table(
                bytes,
                header.e_shoff,
                header.e_shentsize,
                header.e_shnum,
                "section header table",
            )?
        };

        Ok(Self {
            bytes,
            header,
            program_headers,
            section_headers,
        })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn header(&self) -> &Elf64Ehdr {
        &self.header
    }

    /// Declared (untranslated) entry point.
    pub fn entry(&self) -> u64 {
        self.header.e_entry
    }

    pub fn program_headers(&self) -> &[Elf64Phdr] {
        &self.program_headers
    }

    pub fn section_headers(&self) -> &[Elf64Shdr] {
        &self.section_headers
    }

    pub fn loadable_segment_count(&self) -> usize {
        self.program_headers
            .iter()
            .filter(|ph| ph.p_type == PT_LOAD)
            .count()
    }

    /// The first `PT_LOAD` segment. Later loadable segments are not handled.
    pub fn first_loadable_segment(&self) -> Result<LoadableSegment, LoadError> {
        let ph = self
            .program_headers
            .iter()
            .find(|ph| ph.p_type == PT_LOAD)
            .ok_or(LoadError::NoLoadableSegment)?;
        let segment = LoadableSegment::from_header(ph)?;
        bytes::checked_end(
            self.bytes,
            segment.offset as usize,
            segment.file_size as usize,
            "loadable segment",
        )?;
        Ok(segment)
    }

    /// The on-disk bytes of `segment`.
    pub fn segment_bytes(&self, segment: &LoadableSegment) -> Result<&'a [u8], LoadError> {
        bytes::slice_at(
            self.bytes,
            segment.offset as usize,
            segment.file_size as usize,
            "loadable segment",
        )
    }
}
