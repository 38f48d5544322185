#![no_std]

//! Firmware-agnostic half of the Lantern loader.
//!
//! Everything here works on in-memory byte buffers and talks to the platform
//! only through [`firmware::Firmware`], so it runs unchanged under the host
//! test crate. `main.rs` supplies the UEFI-backed implementation.

extern crate alloc;

pub mod address;
pub mod bytes;
pub mod config;
pub mod elf;
pub mod error;
pub mod firmware;
pub mod initializers;
pub mod loader;
pub mod psf;
pub mod video;
