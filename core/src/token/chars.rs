//! Character classification for the scanner.
//!
//! ASCII goes through a bit-flag table; everything above 0x7F is looked up in a
//! sorted range table with binary search.

const ASCII_WHITESPACE: u8 = 1 << 0;
const ASCII_DIGIT: u8 = 1 << 1;
const ASCII_IDENT: u8 = 1 << 2;
const ASCII_HEX: u8 = 1 << 3;

const fn build_ascii_class() -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < 128 {
        let c = i as u8;
        if matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C) {
            table[i] |= ASCII_WHITESPACE;
        }
        if c >= b'0' && c <= b'9' {
            table[i] |= ASCII_DIGIT | ASCII_IDENT | ASCII_HEX;
        }
        if (c >= b'a' && c <= b'z') || (c >= b'A' && c <= b'Z') || c == b'_' || c == b'$' {
            table[i] |= ASCII_IDENT;
        }
        if (c >= b'a' && c <= b'f') || (c >= b'A' && c <= b'F') {
            table[i] |= ASCII_HEX;
        }
        i += 1;
    }
    table
}

const ASCII_CLASS: [u8; 128] = build_ascii_class();

/// Non-ASCII code points accepted inside identifiers (letters and combining marks).
/// Must stay sorted and non-overlapping.
static IDENT_RANGES: &[(u32, u32)] = &[
    (0x00AA, 0x00AA),
    (0x00B5, 0x00B5),
    (0x00BA, 0x00BA),
    (0x00C0, 0x00D6),
    (0x00D8, 0x00F6),
    (0x00F8, 0x02C1),
    (0x02C6, 0x02D1),
    (0x02E0, 0x02E4),
    (0x0300, 0x0374),
    (0x0376, 0x0377),
    (0x037A, 0x037D),
    (0x0386, 0x0386),
    (0x0388, 0x03FF),
    (0x0400, 0x0481),
    (0x0483, 0x052F),
    (0x0531, 0x0556),
    (0x0561, 0x0587),
    (0x0591, 0x05BD),
    (0x05D0, 0x05EA),
    (0x0610, 0x061A),
    (0x0620, 0x0669),
    (0x066E, 0x06D3),
    (0x06D5, 0x06DC),
    (0x06E1, 0x06E8),
    (0x06EA, 0x06FC),
    (0x0710, 0x074A),
    (0x0780, 0x07B1),
    (0x0900, 0x0963),
    (0x0966, 0x096F),
    (0x0971, 0x0983),
    (0x0985, 0x09B9),
    (0x0A01, 0x0A75),
    (0x0A81, 0x0AEF),
    (0x0B01, 0x0B6F),
    (0x0B82, 0x0BEF),
    (0x0C00, 0x0C6F),
    (0x0C80, 0x0CEF),
    (0x0D00, 0x0D6F),
    (0x0E01, 0x0E3A),
    (0x0E40, 0x0E4E),
    (0x0E50, 0x0E59),
    (0x0E81, 0x0EDF),
    (0x0F00, 0x0F00),
    (0x0F40, 0x0F6C),
    (0x1000, 0x1049),
    (0x10A0, 0x10FF),
    (0x1100, 0x1248),
    (0x1E00, 0x1F15),
    (0x1F18, 0x1FBC),
    (0x1FC2, 0x1FFC),
    (0x2071, 0x2071),
    (0x207F, 0x207F),
    (0x2090, 0x209C),
    (0x2102, 0x2102),
    (0x2107, 0x2107),
    (0x210A, 0x2113),
    (0x2115, 0x2115),
    (0x2119, 0x211D),
    (0x2124, 0x2124),
    (0x2126, 0x2126),
    (0x2128, 0x2128),
    (0x212A, 0x212D),
    (0x212F, 0x2139),
    (0x2C00, 0x2CE4),
    (0x2D00, 0x2D25),
    (0x3005, 0x3007),
    (0x3021, 0x3029),
    (0x3031, 0x3035),
    (0x3038, 0x303C),
    (0x3041, 0x3096),
    (0x3099, 0x309F),
    (0x30A1, 0x30FA),
    (0x30FC, 0x30FF),
    (0x3105, 0x312F),
    (0x3131, 0x318E),
    (0x31A0, 0x31BF),
    (0x31F0, 0x31FF),
    (0x3400, 0x4DBF),
    (0x4E00, 0x9FFF),
    (0xA000, 0xA48C),
    (0xA4D0, 0xA4FD),
    (0xA500, 0xA60C),
    (0xA640, 0xA66E),
    (0xAC00, 0xD7A3),
    (0xF900, 0xFA6D),
    (0xFB00, 0xFB06),
    (0xFB1D, 0xFB4F),
    (0xFE70, 0xFEFC),
    (0xFF10, 0xFF19),
    (0xFF21, 0xFF3A),
    (0xFF3F, 0xFF3F),
    (0xFF41, 0xFF5A),
    (0xFF66, 0xFFDC),
    (0x10000, 0x1FFFF),
    (0x20000, 0x2FA1F),
];

#[inline]
fn in_ranges(c: char, ranges: &[(u32, u32)]) -> bool {
    let cp = c as u32;
    ranges
        .binary_search_by(|&(lo, hi)| {
            if hi < cp {
                std::cmp::Ordering::Less
            } else if lo > cp {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

#[inline]
pub fn is_ident_char(c: char) -> bool {
    if c.is_ascii() {
        ASCII_CLASS[c as usize] & ASCII_IDENT != 0
    } else {
        in_ranges(c, IDENT_RANGES)
    }
}

#[inline]
pub fn is_space(c: char) -> bool {
    if c.is_ascii() {
        ASCII_CLASS[c as usize] & ASCII_WHITESPACE != 0
    } else {
        c.is_whitespace()
    }
}

/// Space or tab only; newlines are significant to the scanner.
#[inline]
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[inline]
pub fn is_digit(c: char) -> bool {
    c.is_ascii() && ASCII_CLASS[c as usize] & ASCII_DIGIT != 0
}

#[inline]
pub fn is_hex_digit(c: char) -> bool {
    c.is_ascii() && ASCII_CLASS[c as usize] & ASCII_HEX != 0
}
