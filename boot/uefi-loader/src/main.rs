#![no_std]
#![no_main]

extern crate alloc;

use alloc::vec::Vec;
use core::fmt::Debug;

use lantern_boot_info::FramebufferDescriptor;
use lantern_uefi_loader::error::LoadError;
use lantern_uefi_loader::firmware::Firmware;
use lantern_uefi_loader::loader::BootLoader;
use lantern_uefi_loader::video::VideoModeInfo;
use uefi::prelude::*;
use uefi::proto::console::gop::{GraphicsOutput, PixelFormat};
use uefi::proto::loaded_image::LoadedImage;
use uefi::proto::media::file::{Directory, File, FileAttribute, FileMode, RegularFile};
use uefi::proto::media::fs::SimpleFileSystem;
use uefi::table::boot::{AllocateType, MemoryType, OpenProtocolAttributes, OpenProtocolParams};
use uefi::{CString16, Error, Handle, Status};

#[entry]
fn efi_main(image: Handle, mut st: SystemTable<Boot>) -> Status {
    if let Err(e) = uefi::helpers::init(&mut st) {
        return e.status();
    }

    log::info!("Lantern UEFI loader starting");

    let mut firmware = UefiFirmware::new(image, st);
    match BootLoader::new(&mut firmware).boot() {
        // SAFETY: `boot` exits boot services before handing back a `Handoff`.
        Ok(handoff) => unsafe { handoff.enter() },
        Err(failure) => {
            log::error!("{}", failure);
            log::error!("Press any key to return to firmware.");
            firmware.wait_for_key();
            failure_status(&failure.error)
        }
    }
}

fn failure_status(error: &LoadError) -> Status {
    match error {
        LoadError::FileNotFound(_) => Status::NOT_FOUND,
        LoadError::AllocationFailed { .. } => Status::OUT_OF_RESOURCES,
        LoadError::NoVideoMode => Status::UNSUPPORTED,
        LoadError::Firmware { status, .. } => Status(*status),
        LoadError::Truncated { .. }
        | LoadError::Corrupt(_)
        | LoadError::BadElfMagic
        | LoadError::NotElf64
        | LoadError::BadFontMagic
        | LoadError::NoLoadableSegment => Status::LOAD_ERROR,
    }
}

fn firmware_error<D: Debug>(operation: &'static str) -> impl FnOnce(Error<D>) -> LoadError {
    move |e: Error<D>| LoadError::Firmware {
        operation,
        status: e.status().0,
    }
}

/// [`Firmware`] backed by UEFI boot services.
///
/// The system table is given up in `exit_boot_services`; every other call
/// fails after that.
struct UefiFirmware {
    image: Handle,
    system_table: Option<SystemTable<Boot>>,
}

impl UefiFirmware {
    fn new(image: Handle, system_table: SystemTable<Boot>) -> Self {
        Self {
            image,
            system_table: Some(system_table),
        }
    }

    fn boot_services(&self) -> Result<&BootServices, LoadError> {
        self.system_table
            .as_ref()
            .map(|st| st.boot_services())
            .ok_or(LoadError::Firmware {
                operation: "boot services",
                status: Status::ABORTED.0,
            })
    }

    fn open_boot_volume(&self) -> Result<Directory, LoadError> {
        let bs = self.boot_services()?;
        let loaded_image = unsafe {
            bs.open_protocol::<LoadedImage>(
                OpenProtocolParams {
                    handle: self.image,
                    agent: self.image,
                    controller: None,
                },
                OpenProtocolAttributes::GetProtocol,
            )
            .map_err(firmware_error("open LoadedImage"))?
        };
        let device_handle = loaded_image
            .get()
            .and_then(|loaded| loaded.device())
            .ok_or(LoadError::Firmware {
                operation: "boot device",
                status: Status::UNSUPPORTED.0,
            })?;

        let mut fs = unsafe {
            bs.open_protocol::<SimpleFileSystem>(
                OpenProtocolParams {
                    handle: device_handle,
                    agent: self.image,
                    controller: None,
                },
                OpenProtocolAttributes::GetProtocol,
            )
            .map_err(firmware_error("open SimpleFileSystem"))?
        };
        let file_system = fs.get_mut().ok_or(LoadError::Firmware {
            operation: "open SimpleFileSystem",
            status: Status::UNSUPPORTED.0,
        })?;
        file_system
            .open_volume()
            .map_err(firmware_error("open volume"))
    }

    fn with_gop<R>(
        &self,
        f: impl FnOnce(&BootServices, &mut GraphicsOutput) -> Result<R, LoadError>,
    ) -> Result<R, LoadError> {
        let bs = self.boot_services()?;
        let handle = bs
            .get_handle_for_protocol::<GraphicsOutput>()
            .map_err(firmware_error("locate GraphicsOutput"))?;
        let mut gop = unsafe {
            bs.open_protocol::<GraphicsOutput>(
                OpenProtocolParams {
                    handle,
                    agent: self.image,
                    controller: None,
                },
                OpenProtocolAttributes::GetProtocol,
            )
            .map_err(firmware_error("open GraphicsOutput"))?
        };
        let gop = gop.get_mut().ok_or(LoadError::Firmware {
            operation: "open GraphicsOutput",
            status: Status::UNSUPPORTED.0,
        })?;
        f(bs, gop)
    }
}

impl Firmware for UefiFirmware {
    fn read_file(&mut self, name: &'static str) -> Result<Vec<u8>, LoadError> {
        let path = CString16::try_from(name).map_err(|_| LoadError::Corrupt("file name is not UCS-2"))?;
        let mut root = self.open_boot_volume()?;
        let handle = root
            .open(&path, FileMode::Read, FileAttribute::empty())
            .map_err(|e: Error| {
                if e.status() == Status::NOT_FOUND {
                    LoadError::FileNotFound(name)
                } else {
                    LoadError::Firmware {
                        operation: "open file",
                        status: e.status().0,
                    }
                }
            })?;
        let Some(file) = handle.into_regular_file() else {
            return Err(LoadError::FileNotFound(name));
        };
        let data = read_entire_file(file)?;
        log::info!("Read {} ({} bytes)", name, data.len());
        Ok(data)
    }

    fn allocate_pages(&mut self, pages: usize, max_address: Option<u64>) -> Result<u64, LoadError> {
        let allocate_type = match max_address {
            Some(max) => AllocateType::MaxAddress(max),
            None => AllocateType::AnyPages,
        };
        self.boot_services()?
            .allocate_pages(allocate_type, MemoryType::LOADER_DATA, pages)
            .map_err(|_| LoadError::AllocationFailed { pages })
    }

    fn free_pages(&mut self, base: u64, pages: usize) {
        let Ok(bs) = self.boot_services() else {
            return;
        };
        if let Err(e) = unsafe { bs.free_pages(base, pages) } {
            log::warn!("Failed to free {} pages at {:#x}: {:?}", pages, base, e.status());
        }
    }

    fn video_modes(&mut self) -> Result<Vec<VideoModeInfo>, LoadError> {
        self.with_gop(|bs, gop| {
            Ok(gop
                .modes(bs)
                .enumerate()
                .map(|(index, mode)| {
                    let info = mode.info();
                    let (width, height) = info.resolution();
                    VideoModeInfo {
                        index: index as u32,
                        width: width as u32,
                        height: height as u32,
                        stride: info.stride() as u32,
                        linear: info.pixel_format() != PixelFormat::BltOnly,
                    }
                })
                .collect())
        })
    }

    fn set_video_mode(&mut self, index: u32) -> Result<FramebufferDescriptor, LoadError> {
        self.with_gop(|bs, gop| {
            let mode = gop
                .modes(bs)
                .nth(index as usize)
                .ok_or(LoadError::NoVideoMode)?;
            gop.set_mode(&mode).map_err(firmware_error("set video mode"))?;

            let info = gop.current_mode_info();
            let (width, height) = info.resolution();
            Ok(FramebufferDescriptor {
                base: gop.frame_buffer().as_mut_ptr() as u64,
                pixels_per_scan_line: info.stride() as u32,
                horizontal_resolution: width as u32,
                vertical_resolution: height as u32,
            })
        })
    }

    fn wait_for_key(&mut self) {
        let Some(st) = self.system_table.as_mut() else {
            return;
        };
        if let Err(e) = st.stdin().reset(false) {
            log::warn!("Keyboard reset failed: {:?}", e.status());
        }
        loop {
            match st.stdin().read_key() {
                Ok(Some(_)) => break,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Keyboard read failed: {:?}", e.status());
                    break;
                }
            }
        }
    }

    fn exit_boot_services(&mut self) {
        if let Some(st) = self.system_table.take() {
            let (_runtime_st, _memory_map) = st.exit_boot_services(MemoryType::LOADER_DATA);
        }
    }
}

fn read_entire_file(mut file: RegularFile) -> Result<Vec<u8>, LoadError> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = file.read(&mut chunk).map_err(firmware_error("read file"))?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
    Ok(buffer)
}
