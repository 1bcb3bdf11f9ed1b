//! Inline style escapes embedded in script strings.
//!
//! Two forms are recognized:
//! - `^N` where `N` is a decimal digit selecting one of [`PALETTE`]
//! - `^xRRGGBB` (or `^XRRGGBB`) with six hex digits
//!
//! Anything else starting with `^` is ordinary text. Script strings are
//! byte strings, so every function here works on bytes; escapes are ASCII,
//! so stripping valid UTF-8 leaves valid UTF-8.

use std::borrow::Cow;

use super::Color;

/// Straight RGB palette selected by `^0`..`^9`.
pub const PALETTE: [[f32; 3]; 10] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.7, 0.7, 0.7],
    [0.4, 0.4, 0.4],
];

const HEX_ESCAPE_LEN: usize = 8;
const DIGIT_ESCAPE_LEN: usize = 2;

/// Length in bytes of the escape starting at `pos`, or 0 if there is none.
pub fn escape_len(text: &[u8], pos: usize) -> usize {
    escape_len_at(text.get(pos..).unwrap_or_default())
}

/// Decodes the escape starting at `pos` into a straight RGB triple.
pub fn decode_escape(text: &[u8], pos: usize) -> Option<[f32; 3]> {
    let bytes = text.get(pos..)?;
    match escape_len_at(bytes) {
        DIGIT_ESCAPE_LEN => Some(PALETTE[(bytes[1] - b'0') as usize]),
        HEX_ESCAPE_LEN => {
            let channel = |i: usize| {
                let hi = hex_value(bytes[i]).unwrap_or(0);
                let lo = hex_value(bytes[i + 1]).unwrap_or(0);
                f32::from(hi * 16 + lo) / 255.0
            };
            Some([channel(2), channel(4), channel(6)])
        }
        _ => None,
    }
}

/// Color selected by an escape at the very start of `text`, if any.
///
/// Interior escapes never change the color of a string.
pub fn leading_color(text: &[u8]) -> Option<Color> {
    decode_escape(text, 0).map(Color::from_rgb)
}

/// Removes every escape from `text`. Bytes outside escapes are kept as-is,
/// whether or not they form UTF-8.
///
/// Removal can bring a `^` next to characters that complete a new escape
/// (`"^^11"`); those are removed too, so the result never contains an escape
/// and stripping is idempotent.
pub fn strip_escapes(text: &[u8]) -> Cow<'_, [u8]> {
    if !text.contains(&b'^') {
        return Cow::Borrowed(text);
    }

    let mut out: Vec<u8> = Vec::with_capacity(text.len());
    for &b in text {
        out.push(b);
        if let Some(len) = trailing_escape_len(&out) {
            out.truncate(out.len() - len);
        }
    }
    Cow::Owned(out)
}

/// [`strip_escapes`] for text that is already UTF-8.
pub fn strip_escapes_str(text: &str) -> Cow<'_, str> {
    match strip_escapes(text.as_bytes()) {
        Cow::Borrowed(_) => Cow::Borrowed(text),
        // Only whole ASCII escapes were removed, so the bytes are still UTF-8.
        Cow::Owned(bytes) => match String::from_utf8(bytes) {
            Ok(s) => Cow::Owned(s),
            Err(_) => Cow::Borrowed(text),
        },
    }
}

// ── byte helpers ──────────────────────────────────────────────────────────

fn escape_len_at(bytes: &[u8]) -> usize {
    match bytes {
        [b'^', d, ..] if d.is_ascii_digit() => DIGIT_ESCAPE_LEN,
        [b'^', b'x' | b'X', rest @ ..]
            if rest.len() >= 6 && rest[..6].iter().all(u8::is_ascii_hexdigit) =>
        {
            HEX_ESCAPE_LEN
        }
        _ => 0,
    }
}

/// Length of an escape that ends exactly at the end of `bytes`.
fn trailing_escape_len(bytes: &[u8]) -> Option<usize> {
    [DIGIT_ESCAPE_LEN, HEX_ESCAPE_LEN].into_iter().find(|&len| {
        bytes.len() >= len && escape_len_at(&bytes[bytes.len() - len..]) == len
    })
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|v| v as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── recognition ───────────────────────────────────────────────────────

    #[test]
    fn digit_escape_is_two_bytes() {
        assert_eq!(escape_len(b"^1abc", 0), 2);
        assert_eq!(escape_len(b"a^9", 1), 2);
        assert_eq!(escape_len(b"^a", 0), 0);
        assert_eq!(escape_len(b"^", 0), 0);
        assert_eq!(escape_len(b"abc", 10), 0);
    }

    #[test]
    fn hex_escape_is_eight_bytes() {
        assert_eq!(escape_len(b"^xFF8000", 0), 8);
        assert_eq!(escape_len(b"^X0a0B0c rest", 0), 8);
        assert_eq!(escape_len(b"^xFF80", 0), 0);
        assert_eq!(escape_len(b"^xZZZZZZ", 0), 0);
    }

    #[test]
    fn decodes_palette_and_hex() {
        assert_eq!(decode_escape(b"^1", 0), Some([1.0, 0.0, 0.0]));
        assert_eq!(decode_escape(b"^8", 0), Some([0.7, 0.7, 0.7]));
        assert_eq!(decode_escape(b"^xFF0000", 0), Some([1.0, 0.0, 0.0]));
        let [r, g, b] = decode_escape(b"^x336699", 0).unwrap();
        assert!((r - 0.2).abs() < 1e-6 && (g - 0.4).abs() < 1e-6 && (b - 0.6).abs() < 1e-6);
        assert_eq!(decode_escape(b"plain", 0), None);
    }

    #[test]
    fn only_a_leading_escape_selects_color() {
        assert_eq!(leading_color(b"^2go"), Some(Color::from_rgb([0.0, 1.0, 0.0])));
        assert_eq!(leading_color(b"go^2"), None);
    }

    // ── stripping ─────────────────────────────────────────────────────────

    #[test]
    fn strips_every_escape() {
        assert_eq!(strip_escapes_str("^1Life: ^x00FF00100^7%"), "Life: 100%");
        assert_eq!(strip_escapes_str("no escapes"), "no escapes");
    }

    #[test]
    fn invalid_hex_is_left_unchanged() {
        assert_eq!(strip_escapes_str("^xZZZZZZ"), "^xZZZZZZ");
        assert_eq!(strip_escapes_str("cost ^x12 gold"), "cost ^x12 gold");
    }

    #[test]
    fn stripping_is_idempotent() {
        let samples = [
            "^^11",
            "^^^123",
            "^x12^1345^26",
            "a^b^^c^9^",
            "^x^1ABCDEF",
            "héllo ^3wörld",
            "",
        ];
        for s in samples {
            let once = strip_escapes_str(s).into_owned();
            assert_eq!(strip_escapes_str(&once), once, "input {s:?}");
        }
    }

    #[test]
    fn keeps_non_utf8_bytes_unchanged() {
        let raw: &[u8] = b"\xff\xfe^xZZ";
        assert_eq!(&*strip_escapes(raw), raw);
        assert!(matches!(strip_escapes(b"\xff\xfe plain"), Cow::Borrowed(_)));
        assert_eq!(&*strip_escapes(b"\xff^1\xfe"), b"\xff\xfe");
    }

    #[test]
    fn keeps_multibyte_text_intact() {
        assert_eq!(strip_escapes_str("^4€ ^x112233ü"), "€ ü");
    }
}
