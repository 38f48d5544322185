//! COM1 log sink.

use core::fmt::{self, Write};

use spin::Mutex;
use uart_16550::SerialPort;

const COM1: u16 = 0x3F8;

/// Lazily programmed UART; the first write brings it up.
struct Com1 {
    port: Option<SerialPort>,
}

impl Com1 {
    const fn new() -> Self {
        Self { port: None }
    }

    fn port(&mut self) -> &mut SerialPort {
        self.port.get_or_insert_with(|| {
            // SAFETY: COM1 is only driven through this mutex.
            let mut port = unsafe { SerialPort::new(COM1) };
            port.init();
            port
        })
    }
}

static COM1_PORT: Mutex<Com1> = Mutex::new(Com1::new());

pub fn init() {
    COM1_PORT.lock().port();
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    COM1_PORT.lock().port().write_fmt(args).ok();
}
