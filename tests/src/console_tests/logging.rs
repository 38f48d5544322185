//! Log lines drawn over the boot screen.

use serial_test::serial;

use crate::console::{self, DEFAULT_BACKGROUND};
use crate::logger::{self, LogLevel};
use crate::mock::{Screen, TestFont};

const SLATE: u32 = 0x001A_1A1A;
const PANIC_BOX: u32 = 0x00AA_0000;

/// Installs a blank-glyph console painted `SLATE`, so every drawn cell shows only its background.
fn install_themed() -> &'static Screen {
    let font: &'static TestFont = Box::leak(Box::new(TestFont::new(8, 8, 128)));
    let screen: &'static mut Screen = Box::leak(Box::new(Screen::new(256, 16, 256)));

    let framebuffer = screen.descriptor();
    assert!(unsafe { console::install(&framebuffer, &font.descriptor()) });
    console::with_console(|c| {
        c.set_background_color(SLATE);
        c.clear_screen();
    });
    screen
}

#[test]
fn test_badges_follow_given_background() {
    for level in [
        LogLevel::ERROR,
        LogLevel::WARN,
        LogLevel::INFO,
        LogLevel::DEBUG,
        LogLevel::TRACE,
    ] {
        assert_eq!(level.badge_colors(SLATE).1, SLATE, "{}", level.as_str());
    }
    assert_eq!(LogLevel::PANIC.badge_colors(SLATE), (0x00FF_FFFF, PANIC_BOX));
    assert_eq!(LogLevel::FATAL.badge_colors(SLATE).1, PANIC_BOX);
}

#[test]
#[serial]
fn test_info_line_keeps_screen_background() {
    let screen = install_themed();

    logger::log(LogLevel::INFO, format_args!("up"));

    assert_eq!(screen.count(DEFAULT_BACKGROUND), 0);
    assert_eq!(screen.count(SLATE), 256 * 16);
    assert_eq!(console::with_console(|c| c.cursor()), Some((0, 1)));
}

#[test]
#[serial]
fn test_panic_badge_gets_its_own_box() {
    let screen = install_themed();

    logger::log(LogLevel::PANIC, format_args!("down"));

    // "[PANIC]" is seven cells of 8x8.
    assert_eq!(screen.count(PANIC_BOX), 7 * 64);
    assert_eq!(screen.count(DEFAULT_BACKGROUND), 0);
}
