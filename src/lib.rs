#![no_std]

//! Lantern kernel.
//!
//! Entered once from the UEFI loader with a [`HandoffRecord`]; firmware
//! services are gone by then and the framebuffer console plus COM1 are the
//! only outputs.

pub mod console;
pub mod init;
pub mod kprintf;
pub mod logger;
#[cfg(feature = "serial_log")]
pub mod serial;

use core::panic::PanicInfo;

use lantern_boot_info::HandoffRecord;

/// Console background painted at boot.
pub const BACKGROUND: u32 = 0x001A_1A1A;
/// Console text color at boot.
pub const FOREGROUND: u32 = 0x00FF_CC00;

const BANNER: &[u8] = b"Welcome to LanternOS.\nCopyright (c) 2021. Licensed under the MIT License.\n";

#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::logger::log($level, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kfatal {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::FATAL, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::ERROR, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::WARN, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::INFO, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::DEBUG, $($arg)*);
    }};
}

#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::TRACE, $($arg)*);
    }};
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::console::_print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

#[cfg(feature = "serial_log")]
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::serial::_print(format_args!($($arg)*))
    };
}

#[cfg(feature = "serial_log")]
#[macro_export]
macro_rules! serial_println {
    () => { $crate::serial_print!("\n") };
    ($($arg:tt)*) => {{
        $crate::serial::_print(format_args!($($arg)*));
        $crate::serial::_print(format_args!("\n"));
    }};
}

pub fn kernel_main(handoff: HandoffRecord) -> ! {
    // Nothing may run before the global constructors.
    let constructors = unsafe { init::run_constructors(&handoff.initializers) };

    logger::init();
    kinfo!(
        "Lantern kernel entered, {} global constructor(s) run",
        constructors
    );

    // SAFETY: the loader hands over both buffers for good.
    if unsafe { console::install(&handoff.framebuffer, &handoff.font) } {
        console::with_console(|console| {
            console.set_colors(FOREGROUND, BACKGROUND);
            console.clear_screen();
            console.puts(BANNER);
        });
    } else {
        kwarn!("Framebuffer or font unusable; console disabled, logging to serial only");
    }

    report_handoff(&handoff);

    halt_loop()
}

fn report_handoff(handoff: &HandoffRecord) {
    let fb = &handoff.framebuffer;
    let font = &handoff.font;
    kinfo!(
        "Framebuffer {}x{} (stride {}) at {:#x}",
        fb.horizontal_resolution,
        fb.vertical_resolution,
        fb.pixels_per_scan_line,
        fb.base
    );
    kinfo!(
        "Font {} glyphs {}x{} at {:#x}",
        font.glyph_count,
        font.glyph_width,
        font.glyph_height,
        font.base
    );
    kdebug!(
        "Initializers: {} ctor(s) at {:#x}, {} dtor(s) at {:#x}",
        handoff.initializers.ctor_count,
        handoff.initializers.ctor_addresses,
        handoff.initializers.dtor_count,
        handoff.initializers.dtor_addresses
    );

    if console::is_ready() {
        let (columns, rows) = console::with_console(|c| (c.columns(), c.rows())).unwrap_or((0, 0));
        crate::kprintf!(
            "Console: %u columns x %u rows, framebuffer at %p\n",
            columns,
            rows,
            fb.base as *const u32
        );
    }
}

pub fn panic(info: &PanicInfo) -> ! {
    klog!(logger::LogLevel::PANIC, "------------[ cut here ]------------");
    klog!(logger::LogLevel::PANIC, "Kernel panic - not syncing: {}", info.message());
    if let Some(location) = info.location() {
        klog!(
            logger::LogLevel::PANIC,
            "at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }
    klog!(logger::LogLevel::PANIC, "------------[ end Kernel panic ]------------");
    halt_loop()
}

pub fn halt_loop() -> ! {
    loop {
        x86_64::instructions::interrupts::disable();
        x86_64::instructions::hlt();
    }
}
