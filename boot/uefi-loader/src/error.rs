use core::fmt;

/// Reasons a boot attempt stops. Every variant is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// A read would run past the end of the input buffer.
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },
    /// Header fields are self-inconsistent.
    Corrupt(&'static str),
    BadElfMagic,
    NotElf64,
    BadFontMagic,
    NoLoadableSegment,
    FileNotFound(&'static str),
    /// A firmware call failed with the given raw status code.
    Firmware {
        operation: &'static str,
        status: usize,
    },
    AllocationFailed {
        pages: usize,
    },
    NoVideoMode,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Truncated {
                what,
                needed,
                available,
            } => write!(
                f,
                "{} is truncated or corrupt: needs {} bytes, file has {}",
                what, needed, available
            ),
            LoadError::Corrupt(why) => write!(f, "corrupt input: {}", why),
            LoadError::BadElfMagic => f.write_str(
                "Loaded kernel file does not appear to be in the ELF format! \
                 This loader only supports ELF file format.",
            ),
            LoadError::NotElf64 => f.write_str(
                "Loaded kernel file is not 64 bit. This loader only supports 64 bit kernels.",
            ),
            LoadError::BadFontMagic => {
                f.write_str("PC Screen Font file not recognized as PSF Version 2!")
            }
            LoadError::NoLoadableSegment => f.write_str("kernel image has no PT_LOAD segment"),
            LoadError::FileNotFound(name) => write!(f, "could not open {}", name),
            LoadError::Firmware { operation, status } => {
                write!(f, "firmware call {} failed with status {:#x}", operation, status)
            }
            LoadError::AllocationFailed { pages } => {
                write!(f, "could not allocate {} memory pages", pages)
            }
            LoadError::NoVideoMode => f.write_str("Could not find suitable video mode."),
        }
    }
}
