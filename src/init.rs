//! Global constructors and destructors handed over by the loader.

use core::{mem, ptr};

use lantern_boot_info::InitializerTable;

/// A zero-argument function recorded in `.init_array` or `.fini_array`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Initializer {
    address: u64,
}

impl Initializer {
    /// # Safety
    ///
    /// `address` must be the runtime address of an `extern "C" fn()`.
    pub const unsafe fn from_address(address: u64) -> Self {
        Self { address }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn invoke(self) {
        // SAFETY: guaranteed by `from_address`.
        let function: extern "C" fn() = unsafe { mem::transmute(self.address as usize) };
        function();
    }
}

/// An ordered run of initializers.
#[derive(Clone, Copy, Debug)]
pub struct InitializerList<'a> {
    addresses: &'a [u64],
}

impl<'a> InitializerList<'a> {
    /// # Safety
    ///
    /// Every entry must be the runtime address of an `extern "C" fn()`.
    pub unsafe fn from_addresses(addresses: &'a [u64]) -> Self {
        Self { addresses }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Initializer> + 'a {
        // SAFETY: checked when the list was built.
        self.addresses
            .iter()
            .map(|&address| unsafe { Initializer::from_address(address) })
    }
}

/// Zeroes `[start, end)`. An empty or inverted range is left alone.
///
/// The loader copies only the file-backed part of the image, so `.bss`
/// holds whatever the allocated pages held until this runs.
///
/// # Safety
///
/// The range must be writable and nothing in it may be live.
pub unsafe fn clear_bss(start: *mut u8, end: *mut u8) -> usize {
    let len = (end as usize).saturating_sub(start as usize);
    if len > 0 {
        unsafe { ptr::write_bytes(start, 0, len) };
    }
    len
}

/// Calls every constructor in link order. Returns how many ran.
///
/// # Safety
///
/// `table` must come from the loader and nothing else may have run yet.
pub unsafe fn run_constructors(table: &InitializerTable) -> usize {
    let list = unsafe { InitializerList::from_addresses(table.constructors()) };
    for initializer in list.iter() {
        initializer.invoke();
    }
    list.len()
}

/// Calls every destructor, last registered first. Returns how many ran.
///
/// # Safety
///
/// `table` must come from the loader.
pub unsafe fn run_destructors(table: &InitializerTable) -> usize {
    let list = unsafe { InitializerList::from_addresses(table.destructors()) };
    for initializer in list.iter().rev() {
        initializer.invoke();
    }
    list.len()
}
