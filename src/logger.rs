use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use crate::console;
#[cfg(feature = "serial_log")]
use crate::serial;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);
static BOOT_TSC: AtomicU64 = AtomicU64::new(0);
static TSC_FREQUENCY_HZ: AtomicU64 = AtomicU64::new(DEFAULT_TSC_FREQUENCY_HZ);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(DEFAULT_LEVEL.priority());

const DEFAULT_TSC_FREQUENCY_HZ: u64 = 1_000_000_000; // 1 GHz fallback

#[cfg(feature = "log_debug")]
const DEFAULT_LEVEL: LogLevel = LogLevel::DEBUG;
#[cfg(not(feature = "log_debug"))]
const DEFAULT_LEVEL: LogLevel = LogLevel::INFO;

const TIMESTAMP_COLOR: u32 = 0x0080_8080;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    PANIC,
    FATAL,
    ERROR,
    WARN,
    INFO,
    DEBUG,
    TRACE,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::PANIC => "PANIC",
            LogLevel::FATAL => "FATAL",
            LogLevel::ERROR => "ERROR",
            LogLevel::WARN => "WARN",
            LogLevel::INFO => "INFO",
            LogLevel::DEBUG => "DEBUG",
            LogLevel::TRACE => "TRACE",
        }
    }

    #[cfg(feature = "serial_log")]
    fn serial_color(self) -> &'static str {
        match self {
            LogLevel::PANIC | LogLevel::FATAL => "\x1b[1;37;41m",
            LogLevel::ERROR => "\x1b[1;31m",
            LogLevel::WARN => "\x1b[33m",
            LogLevel::INFO => "\x1b[32m",
            LogLevel::DEBUG => "\x1b[36m",
            LogLevel::TRACE => "\x1b[90m",
        }
    }

    /// Foreground/background used for the level badge on the console.
    /// Only PANIC and FATAL get a box of their own; the rest sit on `background`.
    pub fn badge_colors(self, background: u32) -> (u32, u32) {
        match self {
            LogLevel::PANIC | LogLevel::FATAL => (0x00FF_FFFF, 0x00AA_0000),
            LogLevel::ERROR => (0x00FF_5555, background),
            LogLevel::WARN => (0x00FF_FF55, background),
            LogLevel::INFO => (0x0055_FF55, background),
            LogLevel::DEBUG => (0x0055_FFFF, background),
            LogLevel::TRACE => (0x00AA_AAAA, background),
        }
    }

    const fn priority(self) -> u8 {
        match self {
            LogLevel::PANIC => 0,
            LogLevel::FATAL => 1,
            LogLevel::ERROR => 2,
            LogLevel::WARN => 3,
            LogLevel::INFO => 4,
            LogLevel::DEBUG => 5,
            LogLevel::TRACE => 6,
        }
    }
}

/// Starts the boot clock and brings up the serial sink.
pub fn init() {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }

    #[cfg(feature = "serial_log")]
    serial::init();

    BOOT_TSC.store(read_tsc(), Ordering::Relaxed);
    if let Some(frequency) = detect_tsc_frequency() {
        TSC_FREQUENCY_HZ.store(frequency, Ordering::Relaxed);
    }
}

pub fn log(level: LogLevel, args: fmt::Arguments<'_>) {
    if level.priority() > LOG_LEVEL.load(Ordering::Relaxed) {
        return;
    }

    let timestamp_us = boot_time_us();

    #[cfg(feature = "serial_log")]
    emit_serial_line(level, timestamp_us, args);

    emit_console_line(level, timestamp_us, args);
}

pub fn boot_time_us() -> u64 {
    let start = BOOT_TSC.load(Ordering::Relaxed);
    let freq = TSC_FREQUENCY_HZ.load(Ordering::Relaxed);
    if start == 0 || freq == 0 {
        return 0;
    }

    let ticks = read_tsc().saturating_sub(start);
    ticks.saturating_mul(1_000_000) / freq
}

#[cfg(feature = "serial_log")]
fn emit_serial_line(level: LogLevel, timestamp_us: u64, args: fmt::Arguments<'_>) {
    serial::_print(format_args!(
        "{color}[{timestamp}] [{level:<5}] {message}\x1b[0m\n",
        color = level.serial_color(),
        timestamp = TimestampDisplay {
            microseconds: timestamp_us
        },
        level = LevelDisplay(level),
        message = args,
    ));
}

fn emit_console_line(level: LogLevel, timestamp_us: u64, args: fmt::Arguments<'_>) {
    if !console::is_ready() {
        return;
    }

    // The console may already be locked by whoever is logging.
    let _ = console::try_with_console(|console| {
        let bg = console.background();
        let mut line = LineBuffer::new();

        let _ = write!(line, "[{}] ", TimestampDisplay { microseconds: timestamp_us });
        console.puts_with_colors(line.as_bytes(), TIMESTAMP_COLOR, bg);

        line.clear();
        let _ = write!(line, "[{}]", LevelDisplay(level));
        let (badge_fg, badge_bg) = level.badge_colors(bg);
        console.puts_with_colors(line.as_bytes(), badge_fg, badge_bg);

        line.clear();
        let _ = write!(line, " {}", args);
        console.puts(line.as_bytes());
        console.new_line();
    });
}

fn read_tsc() -> u64 {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::x86_64::_rdtsc()
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        0
    }
}

fn detect_tsc_frequency() -> Option<u64> {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        use core::arch::x86_64::__cpuid_count;

        let highest_leaf = __cpuid_count(0, 0).eax;

        if highest_leaf >= 0x15 {
            let leaf = __cpuid_count(0x15, 0);
            let denom = leaf.eax as u64;
            let numer = leaf.ebx as u64;
            let crystal = leaf.ecx as u64;
            if denom != 0 && numer != 0 && crystal != 0 {
                return Some(crystal * numer / denom);
            }
        }

        if highest_leaf >= 0x16 {
            let base_mhz = __cpuid_count(0x16, 0).eax as u64;
            if base_mhz != 0 {
                return Some(base_mhz * 1_000_000);
            }
        }
    }

    None
}

struct TimestampDisplay {
    microseconds: u64,
}

impl fmt::Display for TimestampDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.microseconds / 1_000_000;
        let micros = self.microseconds % 1_000_000;
        write!(f, "{:>5}.{:06}", seconds, micros)
    }
}

struct LevelDisplay(LogLevel);

impl fmt::Display for LevelDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<5}", self.0.as_str())
    }
}

/// Fixed-size line buffer; output past the end is cut off.
struct LineBuffer {
    buf: [u8; 256],
    len: usize,
}

impl LineBuffer {
    const fn new() -> Self {
        Self {
            buf: [0; 256],
            len: 0,
        }
    }

    fn clear(&mut self) {
        self.len = 0;
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.len;
        let take = s.len().min(room);
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        if take < s.len() {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}
