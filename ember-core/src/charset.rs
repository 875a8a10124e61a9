// charset.rs — the 8-bit character set used by text-format carts.
//
// Every byte 0..255 maps to a UTF-8 glyph; the table below is part of the
// cart format ABI. A U+FE0F variation selector in the source literal
// extends the previous entry (its UTF-8 span grows and its UTF-32 form
// gains a second codepoint) without creating a new byte.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// One glyph per byte, in byte order. Bytes 0x00..0x0f keep their control
/// characters; the rest are the console's symbol and kana pages.
const GLYPHS: &str = concat!(
    "\u{0}\u{1}\u{2}\u{3}\u{4}\u{5}\u{6}\u{7}\u{8}\t\n\u{b}\u{c}\r\u{e}\u{f}",
    "▮■□⁙⁘‖◀▶「」¥•、。゛゜",
    " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNO",
    "PQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~○",
    "█▒🐱⬇\u{fe0f}░✽●♥☉웃⌂⬅\u{fe0f}😐♪🅾\u{fe0f}◆…➡\u{fe0f}★⧗⬆\u{fe0f}ˇ∧❎▤▥あいうえおか",
    "きくけこさしすせそたちつてとなにぬねのはひふへほまみむめもやゆよ",
    "らりるれろわをんっゃゅょアイウエオカキクケコサシスセソタチツテト",
    "ナニヌネノハヒフヘホマミムメモヤユヨラリルレロワヲンッャュョ◜◝",
);

pub struct Charset {
    utf8: [&'static str; 256],
    utf32: [(char, Option<char>); 256],
    reverse: BTreeMap<char, u8>,
}

impl Default for Charset {
    fn default() -> Self {
        Self::new()
    }
}

impl Charset {
    pub fn new() -> Self {
        let mut utf8 = [""; 256];
        let mut utf32 = [('\0', None); 256];
        let mut reverse = BTreeMap::new();

        let mut iter = GLYPHS.char_indices().peekable();
        let mut idx = 0usize;
        while let Some((pos, ch)) = iter.next() {
            let mut end = pos + ch.len_utf8();
            let mut selector = None;
            if let Some(&(_, next)) = iter.peek() {
                if next == '\u{fe0f}' {
                    let (npos, nch) = iter.next().unwrap();
                    end = npos + nch.len_utf8();
                    selector = Some(nch);
                }
            }
            utf8[idx] = &GLYPHS[pos..end];
            utf32[idx] = (ch, selector);
            reverse.insert(ch, idx as u8);
            idx += 1;
        }
        debug_assert_eq!(idx, 256, "glyph table must hold exactly 256 entries");

        Charset {
            utf8,
            utf32,
            reverse,
        }
    }

    /// The UTF-8 form of byte `b` (1..8 bytes, never empty).
    pub fn utf8(&self, b: u8) -> &'static str {
        self.utf8[b as usize]
    }

    /// The UTF-32 form of byte `b`: the base codepoint plus the variation
    /// selector when the entry carries one.
    pub fn utf32(&self, b: u8) -> (char, Option<char>) {
        self.utf32[b as usize]
    }

    /// The byte whose glyph starts with `c`, if any.
    pub fn byte_from_char(&self, c: char) -> Option<u8> {
        self.reverse.get(&c).copied()
    }

    /// Decode charset bytes to UTF-8 text.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        for &b in bytes {
            out.push_str(self.utf8[b as usize]);
        }
        out
    }

    /// Encode UTF-8 text to charset bytes. Each position takes the longest
    /// glyph match (a selector following a selector-bearing glyph belongs to
    /// it); characters outside the table pass through as raw UTF-8 bytes.
    pub fn encode(&self, s: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(s.len());
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            match self.reverse.get(&c) {
                Some(&b) => {
                    out.push(b);
                    if self.utf32[b as usize].1.is_some() && chars.peek() == Some(&'\u{fe0f}') {
                        chars.next();
                    }
                }
                None => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_byte_has_a_nonempty_utf8_form() {
        let cs = Charset::new();
        for b in 0..=255u8 {
            assert!(!cs.utf8(b).is_empty(), "byte {:#04x} has an empty glyph", b);
            assert!(cs.utf8(b).len() <= 8, "glyph for {:#04x} exceeds 8 bytes", b);
        }
    }

    #[test]
    fn test_round_trip_every_byte() {
        let cs = Charset::new();
        for b in 0..=255u8 {
            let text = cs.decode(&[b]);
            let back = cs.encode(&text);
            assert_eq!(back, [b], "byte {:#04x} did not round-trip", b);
        }
    }

    #[test]
    fn test_ascii_maps_to_itself() {
        let cs = Charset::new();
        for b in 0x20..0x7fu8 {
            assert_eq!(cs.utf8(b).as_bytes(), [b], "ASCII {:#04x} must be identity", b);
        }
        assert_eq!(cs.encode("hello, world"), b"hello, world");
    }

    #[test]
    fn test_selector_entries_carry_two_codepoints() {
        let cs = Charset::new();
        let mut selector_count = 0;
        for b in 0..=255u8 {
            if let (_, Some(sel)) = cs.utf32(b) {
                assert_eq!(sel, '\u{fe0f}');
                assert!(cs.utf8(b).chars().count() == 2);
                selector_count += 1;
            } else {
                assert_eq!(cs.utf8(b).chars().count(), 1);
            }
        }
        assert_eq!(selector_count, 5, "five glyphs carry a variation selector");
    }

    #[test]
    fn test_reverse_lookup_is_injective_on_glyph_heads() {
        let cs = Charset::new();
        for b in 0..=255u8 {
            let (head, _) = cs.utf32(b);
            assert_eq!(
                cs.byte_from_char(head),
                Some(b),
                "glyph head for {:#04x} resolves to a different byte",
                b
            );
        }
    }

    #[test]
    fn test_unknown_chars_pass_through() {
        let cs = Charset::new();
        let out = cs.encode("é");
        assert_eq!(out, "é".as_bytes());
    }

    #[test]
    fn test_multiline_text_round_trips() {
        let cs = Charset::new();
        let text = "print(\"hi\")\nx += 1\n";
        assert_eq!(cs.decode(&cs.encode(text)), text);
    }
}
