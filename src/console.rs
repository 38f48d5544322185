use core::fmt::{self, Write};
use core::ptr;
use core::sync::atomic::{AtomicBool, Ordering};

use lantern_boot_info::{FontDescriptor, FramebufferDescriptor};
use spin::Mutex;

use crate::kprintf::{self, Arg, CharSink};

/// Drawn in place of bytes the font has no glyph for.
const REPLACEMENT_GLYPH: u8 = b'?';

pub const DEFAULT_FOREGROUND: u32 = 0x00FF_FFFF;
pub const DEFAULT_BACKGROUND: u32 = 0x0000_0000;

/// Text console drawn with a PSF2 bitmap font on a linear 32-bit
/// framebuffer.
///
/// Only the visible `width x height` area is ever touched; the columns
/// between `width` and the scanline stride are padding.
pub struct Console {
    buffer: *mut u32,
    stride: usize,
    width: usize,
    height: usize,
    glyphs: *const u8,
    glyph_count: usize,
    bytes_per_glyph: usize,
    bytes_per_row: usize,
    glyph_width: usize,
    glyph_height: usize,
    cursor_x: usize,
    cursor_y: usize,
    columns: usize,
    rows: usize,
    fg: u32,
    bg: u32,
}

unsafe impl Send for Console {}

impl Console {
    /// Builds a console over the loader-provided buffers.
    ///
    /// Returns `None` when either descriptor is unusable or the font does
    /// not fit a single cell on screen.
    ///
    /// # Safety
    ///
    /// `framebuffer.base` must point at `buffer_len()` writable `u32`s and
    /// `font.base` at `data_len()` readable bytes, both for as long as the
    /// console lives.
    pub unsafe fn new(framebuffer: &FramebufferDescriptor, font: &FontDescriptor) -> Option<Self> {
        if !framebuffer.is_valid() || !font.is_valid() {
            return None;
        }

        let glyph_width = font.glyph_width as usize;
        let glyph_height = font.glyph_height as usize;
        let bytes_per_row = font.bytes_per_row();
        if (font.bytes_per_glyph as usize) < bytes_per_row * glyph_height {
            return None;
        }

        let width = framebuffer.horizontal_resolution as usize;
        let height = framebuffer.vertical_resolution as usize;
        let columns = width / glyph_width;
        let rows = height / glyph_height;
        if columns == 0 || rows == 0 {
            return None;
        }

        Some(Self {
            buffer: framebuffer.base as *mut u32,
            stride: framebuffer.pixels_per_scan_line as usize,
            width,
            height,
            glyphs: font.base as *const u8,
            glyph_count: font.glyph_count as usize,
            bytes_per_glyph: font.bytes_per_glyph as usize,
            bytes_per_row,
            glyph_width,
            glyph_height,
            cursor_x: 0,
            cursor_y: 0,
            columns,
            rows,
            fg: DEFAULT_FOREGROUND,
            bg: DEFAULT_BACKGROUND,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cursor position as `(column, row)`.
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_x, self.cursor_y)
    }

    pub fn foreground(&self) -> u32 {
        self.fg
    }

    pub fn background(&self) -> u32 {
        self.bg
    }

    pub fn plot_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        unsafe {
            ptr::write_volatile(self.buffer.add(y * self.stride + x), color);
        }
    }

    /// Color at a visible pixel.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(unsafe { ptr::read_volatile(self.buffer.add(y * self.stride + x)) })
    }

    pub fn new_line(&mut self) {
        self.cursor_x = 0;
        self.cursor_y += 1;
    }

    /// Draws `ch` at the cursor and advances one column.
    ///
    /// Past the last row glyphs are clipped; the console does not scroll.
    pub fn put_char(&mut self, ch: u8, fg: u32, bg: u32) {
        if ch == b'\n' {
            self.new_line();
            return;
        }

        if self.cursor_x >= self.columns {
            self.new_line();
        }

        let index = if (ch as usize) < self.glyph_count {
            ch as usize
        } else {
            REPLACEMENT_GLYPH as usize
        };
        if index < self.glyph_count {
            self.draw_glyph(index, fg, bg);
        }

        self.cursor_x += 1;
    }

    fn draw_glyph(&mut self, index: usize, fg: u32, bg: u32) {
        let origin_x = self.cursor_x * self.glyph_width;
        let origin_y = self.cursor_y * self.glyph_height;
        let glyph = unsafe { self.glyphs.add(index * self.bytes_per_glyph) };

        for row in 0..self.glyph_height {
            let row_bytes = unsafe { glyph.add(row * self.bytes_per_row) };
            for col in 0..self.glyph_width {
                let byte = unsafe { ptr::read(row_bytes.add(col / 8)) };
                let lit = byte & (0x80 >> (col % 8)) != 0;
                self.plot_pixel(origin_x + col, origin_y + row, if lit { fg } else { bg });
            }
        }
    }

    /// Writes a byte with the current colors.
    pub fn write_byte(&mut self, byte: u8) {
        self.put_char(byte, self.fg, self.bg);
    }

    pub fn puts(&mut self, text: &[u8]) {
        for &byte in text {
            self.write_byte(byte);
        }
    }

    pub fn puts_with_colors(&mut self, text: &[u8], fg: u32, bg: u32) {
        for &byte in text {
            self.put_char(byte, fg, bg);
        }
    }

    /// Sets both colors; later text with no explicit colors uses them.
    pub fn set_colors(&mut self, fg: u32, bg: u32) {
        self.set_foreground_color(fg);
        self.set_background_color(bg);
    }

    /// Changes the text color, recoloring everything already drawn in the
    /// old one.
    pub fn set_foreground_color(&mut self, color: u32) {
        self.repaint(self.fg, color);
        self.fg = color;
    }

    /// Changes the background color, recoloring every pixel still showing
    /// the old one.
    pub fn set_background_color(&mut self, color: u32) {
        self.repaint(self.bg, color);
        self.bg = color;
    }

    fn repaint(&mut self, from: u32, to: u32) {
        if from == to {
            return;
        }
        for y in 0..self.height {
            for x in 0..self.width {
                if self.pixel(x, y) == Some(from) {
                    self.plot_pixel(x, y, to);
                }
            }
        }
    }

    /// Fills the screen with the background color and homes the cursor.
    pub fn clear_screen(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.plot_pixel(x, y, self.bg);
            }
        }
        self.cursor_x = 0;
        self.cursor_y = 0;
    }
}

impl CharSink for Console {
    fn put_byte(&mut self, byte: u8) {
        self.write_byte(byte);
    }
}

impl Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if ch.is_ascii() {
                self.write_byte(ch as u8);
            } else {
                self.write_byte(REPLACEMENT_GLYPH);
            }
        }
        Ok(())
    }
}

static CONSOLE: Mutex<Option<Console>> = Mutex::new(None);
static CONSOLE_READY: AtomicBool = AtomicBool::new(false);

/// Installs the global console from the loader's descriptors.
///
/// # Safety
///
/// Same contract as [`Console::new`], for the rest of the kernel's life.
pub unsafe fn install(framebuffer: &FramebufferDescriptor, font: &FontDescriptor) -> bool {
    let Some(console) = (unsafe { Console::new(framebuffer, font) }) else {
        return false;
    };
    *CONSOLE.lock() = Some(console);
    CONSOLE_READY.store(true, Ordering::SeqCst);
    true
}

pub fn is_ready() -> bool {
    CONSOLE_READY.load(Ordering::SeqCst)
}

pub fn with_console<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Console) -> R,
{
    CONSOLE.lock().as_mut().map(f)
}

/// Like [`with_console`] but gives up instead of spinning on a held lock.
pub fn try_with_console<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Console) -> R,
{
    CONSOLE.try_lock()?.as_mut().map(f)
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    if let Some(mut guard) = CONSOLE.try_lock() {
        if let Some(console) = guard.as_mut() {
            console.write_fmt(args).ok();
        }
    }
}

/// Backs the [`kprintf!`](crate::kprintf!) macro.
pub fn kprintf(format: &[u8], args: &[Arg<'_>]) -> usize {
    with_console(|console| kprintf::kprintf_to(console, format, args)).unwrap_or(0)
}
