#![no_std]
#![no_main]

use core::panic::PanicInfo;
use core::ptr::addr_of_mut;

use lantern_boot_info::HandoffRecord;

extern "C" {
    static mut __bss_start: u8;
    static mut __bss_end: u8;
}

#[no_mangle]
pub extern "sysv64" fn kmain(handoff: HandoffRecord) -> ! {
    // Every zero-initialized static lives in .bss; clear it before any of them is read.
    unsafe { lantern::init::clear_bss(addr_of_mut!(__bss_start), addr_of_mut!(__bss_end)) };
    lantern::kernel_main(handoff)
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    lantern::panic(info)
}
