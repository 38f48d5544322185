//! printf-style formatting for the framebuffer console.
//!
//! Conversions follow C: `%[flags][width][.precision][length]specifier`
//! with flags `-0#+ `, specifiers `d i u o x X p c s %`. Length modifiers
//! are parsed and ignored because every [`Arg`] already carries its width.

/// Byte-at-a-time output target.
pub trait CharSink {
    fn put_byte(&mut self, byte: u8);

    fn put_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.put_byte(byte);
        }
    }
}

/// One formatting argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arg<'a> {
    Int(i64),
    Uint(u64),
    Ptr(u64),
    Char(u8),
    /// Printed up to the first NUL or the end of the slice.
    Str(&'a [u8]),
}

impl Arg<'_> {
    fn as_signed(&self) -> i64 {
        match *self {
            Arg::Int(v) => v,
            Arg::Uint(v) | Arg::Ptr(v) => v as i64,
            Arg::Char(c) => c as i64,
            Arg::Str(_) => 0,
        }
    }

    fn as_unsigned(&self) -> u64 {
        match *self {
            Arg::Int(v) => v as u64,
            Arg::Uint(v) | Arg::Ptr(v) => v,
            Arg::Char(c) => c as u64,
            Arg::Str(s) => s.as_ptr() as u64,
        }
    }

    fn as_byte(&self) -> u8 {
        match *self {
            Arg::Char(c) => c,
            Arg::Str(s) => s.first().copied().unwrap_or(0),
            other => other.as_unsigned() as u8,
        }
    }
}

macro_rules! impl_arg_from {
    ($variant:ident as $repr:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Arg::$variant(value as $repr)
                }
            }
        )*
    };
}

impl_arg_from!(Int as i64: i8, i16, i32, i64, isize);
impl_arg_from!(Uint as u64: u8, u16, u32, u64, usize);

impl From<char> for Arg<'_> {
    fn from(value: char) -> Self {
        Arg::Char(if value.is_ascii() { value as u8 } else { b'?' })
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(value.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(value: &'a [u8]) -> Self {
        Arg::Str(value)
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(value: *const T) -> Self {
        Arg::Ptr(value as u64)
    }
}

impl<T> From<*mut T> for Arg<'_> {
    fn from(value: *mut T) -> Self {
        Arg::Ptr(value as u64)
    }
}

/// Enough for a 64-bit value in octal.
pub const MAX_DIGITS: usize = 22;

/// Writes `value` in `base` into the tail of `buf` and returns the digits.
pub fn itoa(mut value: u64, base: u32, uppercase: bool, buf: &mut [u8; MAX_DIGITS]) -> &[u8] {
    let table: &[u8; 16] = if uppercase {
        b"0123456789ABCDEF"
    } else {
        b"0123456789abcdef"
    };
    let base = base as u64;
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = table[(value % base) as usize];
        value /= base;
        if value == 0 {
            break;
        }
    }
    &buf[pos..]
}

#[derive(Clone, Copy, Default)]
struct Conversion {
    left: bool,
    zero: bool,
    alternate: bool,
    plus: bool,
    space: bool,
    width: usize,
    precision: Option<usize>,
}

struct Counting<'s, S: CharSink + ?Sized> {
    sink: &'s mut S,
    written: usize,
}

impl<S: CharSink + ?Sized> Counting<'_, S> {
    fn byte(&mut self, byte: u8) {
        self.sink.put_byte(byte);
        self.written += 1;
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.byte(byte);
        }
    }

    fn repeat(&mut self, byte: u8, count: usize) {
        for _ in 0..count {
            self.byte(byte);
        }
    }
}

fn parse_number(format: &[u8], pos: &mut usize) -> usize {
    let mut value = 0usize;
    while let Some(&digit) = format.get(*pos) {
        if !digit.is_ascii_digit() {
            break;
        }
        value = value.saturating_mul(10).saturating_add((digit - b'0') as usize);
        *pos += 1;
    }
    value
}

/// Renders `format` with `args` into `sink` and returns the bytes written.
///
/// A conversion without a matching argument prints nothing, and an unknown
/// specifier is dropped.
pub fn kprintf_to<S: CharSink + ?Sized>(sink: &mut S, format: &[u8], args: &[Arg<'_>]) -> usize {
    let mut out = Counting { sink, written: 0 };
    let mut args = args.iter();
    let mut pos = 0;

    while pos < format.len() {
        let byte = format[pos];
        pos += 1;
        if byte != b'%' {
            out.byte(byte);
            continue;
        }

        let mut conv = Conversion::default();
        while let Some(&flag) = format.get(pos) {
            match flag {
                b'-' => conv.left = true,
                b'0' => conv.zero = true,
                b'#' => conv.alternate = true,
                b'+' => conv.plus = true,
                b' ' => conv.space = true,
                _ => break,
            }
            pos += 1;
        }
        conv.width = parse_number(format, &mut pos);
        if format.get(pos) == Some(&b'.') {
            pos += 1;
            conv.precision = Some(parse_number(format, &mut pos));
        }
        while let Some(&(b'h' | b'l' | b'z' | b'j' | b't')) = format.get(pos) {
            pos += 1;
        }

        let Some(&specifier) = format.get(pos) else {
            break;
        };
        pos += 1;

        match specifier {
            b'%' => out.byte(b'%'),
            b'c' => {
                if let Some(arg) = args.next() {
                    emit_padded(&mut out, &conv, &[arg.as_byte()]);
                }
            }
            b's' => {
                if let Some(arg) = args.next() {
                    let text: &[u8] = match *arg {
                        Arg::Str(s) => s,
                        _ => &[],
                    };
                    let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
                    let end = conv.precision.map_or(end, |p| p.min(end));
                    emit_padded(&mut out, &conv, &text[..end]);
                }
            }
            b'd' | b'i' => {
                if let Some(arg) = args.next() {
                    let value = arg.as_signed();
                    let sign: &[u8] = if value < 0 {
                        b"-"
                    } else if conv.plus {
                        b"+"
                    } else if conv.space {
                        b" "
                    } else {
                        b""
                    };
                    emit_integer(&mut out, &conv, sign, value.unsigned_abs(), 10, false);
                }
            }
            b'u' => {
                if let Some(arg) = args.next() {
                    emit_integer(&mut out, &conv, b"", arg.as_unsigned(), 10, false);
                }
            }
            b'o' => {
                if let Some(arg) = args.next() {
                    emit_integer(&mut out, &conv, b"", arg.as_unsigned(), 8, false);
                }
            }
            b'x' | b'X' => {
                if let Some(arg) = args.next() {
                    let value = arg.as_unsigned();
                    let upper = specifier == b'X';
                    let prefix: &[u8] = match (conv.alternate && value != 0, upper) {
                        (true, false) => b"0x",
                        (true, true) => b"0X",
                        (false, _) => b"",
                    };
                    emit_integer(&mut out, &conv, prefix, value, 16, upper);
                }
            }
            b'p' => {
                if let Some(arg) = args.next() {
                    emit_integer(&mut out, &conv, b"0x", arg.as_unsigned(), 16, false);
                }
            }
            _ => {}
        }
    }

    out.written
}

fn emit_padded<S: CharSink + ?Sized>(out: &mut Counting<'_, S>, conv: &Conversion, body: &[u8]) {
    let padding = conv.width.saturating_sub(body.len());
    if !conv.left {
        out.repeat(b' ', padding);
    }
    out.bytes(body);
    if conv.left {
        out.repeat(b' ', padding);
    }
}

/// Lays out `prefix`, precision zeros and digits inside the field width.
fn emit_integer<S: CharSink + ?Sized>(
    out: &mut Counting<'_, S>,
    conv: &Conversion,
    prefix: &[u8],
    value: u64,
    base: u32,
    uppercase: bool,
) {
    let mut buf = [0u8; MAX_DIGITS];
    let digits: &[u8] = if conv.precision == Some(0) && value == 0 {
        &[]
    } else {
        itoa(value, base, uppercase, &mut buf)
    };

    let mut precision_zeros = conv.precision.unwrap_or(0).saturating_sub(digits.len());
    if base == 8 && conv.alternate && precision_zeros == 0 && digits.first() != Some(&b'0') {
        precision_zeros = 1;
    }

    let body = prefix.len() + precision_zeros + digits.len();
    let padding = conv.width.saturating_sub(body);

    if conv.left {
        out.bytes(prefix);
        out.repeat(b'0', precision_zeros);
        out.bytes(digits);
        out.repeat(b' ', padding);
    } else if conv.zero && conv.precision.is_none() {
        out.bytes(prefix);
        out.repeat(b'0', padding + precision_zeros);
        out.bytes(digits);
    } else {
        out.repeat(b' ', padding);
        out.bytes(prefix);
        out.repeat(b'0', precision_zeros);
        out.bytes(digits);
    }
}

/// Formats to the framebuffer console.
///
/// ```ignore
/// kprintf!("%s: %#x\n", "base", 0x1000u64);
/// ```
#[macro_export]
macro_rules! kprintf {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::console::kprintf(
            $fmt.as_bytes(),
            &[$($crate::kprintf::Arg::from($arg)),*],
        )
    };
}
