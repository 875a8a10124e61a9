// cart.rs — cartridge ROM codec.
//
// A cartridge is an immutable snapshot: a 32 KiB ROM image, the code string,
// a lazily fixed-up copy of it, an optional 128x128 RGBA label and a version
// number. The text format stores each region as hex digit runs under
// `__name__` section headers; the image format hides one byte per pixel in
// the two low bits of the R, G, B and A channels.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::charset::Charset;
use crate::console::RGBA_PALETTE;
use crate::fixup::fix_dialect;
use crate::memory::{Memory, MEM_SIZE, OFFSET_CODE, OFFSET_FLAGS, OFFSET_SFX, OFFSET_SONG};
use crate::{CoreError, Result};

/// Marker for a compressed code section at `OFFSET_CODE`.
const CODE_MAGIC: [u8; 4] = [b':', b'c', b':', 0];

/// Codes 0x01..0x3b of the compressed stream map into this table.
const CODE_LUT: &[u8; 59] = b"\n 0123456789abcdefghijklmnopqrstuvwxyz!#%(){}[]<>+=/*:;.,~_";

/// Back-references reach at most this far behind the cursor.
const CODE_WINDOW: usize = (0xff - 0x3c) * 16 + 15;

pub struct Cart {
    rom: Memory,
    code: String,
    lua: Option<String>,
    label: Option<Vec<u8>>,
    version: i32,
}

impl Cart {
    pub fn rom(&self) -> &Memory {
        &self.rom
    }

    /// The raw code string as authored.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 128x128 RGBA label pixels, when the cart carries one.
    pub fn label(&self) -> Option<&[u8]> {
        self.label.as_deref()
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// The code after dialect fixup; computed once and memoized.
    pub fn lua(&mut self) -> &str {
        if self.lua.is_none() {
            self.lua = Some(fix_dialect(&self.code));
        }
        self.lua.as_deref().unwrap_or("")
    }

    /// The code section in its on-cart compressed form.
    pub fn compressed_code(&self) -> Vec<u8> {
        let bytes = Charset::new().encode(&self.code);
        let stream = compress(&bytes);
        let mut out = Vec::with_capacity(stream.len() + 8);
        out.extend_from_slice(&CODE_MAGIC);
        out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&stream);
        out
    }
}

// ---------------------------------------------------------------------------
// Text format
// ---------------------------------------------------------------------------

pub fn hex_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

/// Label pixels use an extended digit set covering 32 colors.
fn label_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'v' => c - b'a' + 10,
        _ => 0,
    }
}

impl Cart {
    /// Parse a text-format cart. Unknown sections are skipped; missing ones
    /// leave their region zeroed.
    pub fn from_p8_text(source: &str) -> Cart {
        let mut rom = Memory::new();
        let mut code = String::new();
        let mut label = None;
        let mut version = 0;

        let mut section = "";
        let mut lines: Vec<&str> = Vec::new();

        let flush = |section: &str, lines: &[&str], rom: &mut Memory, code: &mut String, label: &mut Option<Vec<u8>>| {
            match section {
                "__lua__" => *code = lines.join("\n"),
                "__gfx__" => parse_gfx(lines, rom),
                "__gff__" => parse_gff(lines, rom),
                "__map__" => parse_map(lines, rom),
                "__sfx__" => parse_sfx(lines, rom),
                "__music__" => parse_music(lines, rom),
                "__label__" => *label = Some(parse_label(lines)),
                _ => {}
            }
        };

        for line in source.lines() {
            if line.starts_with("__") && line.trim_end().ends_with("__") {
                flush(section, &lines, &mut rom, &mut code, &mut label);
                section = line.trim();
                lines.clear();
            } else if section.is_empty() {
                if let Some(v) = line.strip_prefix("version ") {
                    version = v.trim().parse().unwrap_or(0);
                }
            } else {
                lines.push(line);
            }
        }
        flush(section, &lines, &mut rom, &mut code, &mut label);

        Cart {
            rom,
            code,
            lua: None,
            label,
            version,
        }
    }
}

fn parse_gfx(lines: &[&str], rom: &mut Memory) {
    for (y, line) in lines.iter().enumerate().take(128) {
        for (x, &c) in line.as_bytes().iter().enumerate().take(128) {
            rom.set_gfx_pixel(x as i32, y as i32, hex_digit(c));
        }
    }
}

fn parse_gff(lines: &[&str], rom: &mut Memory) {
    let mut i = 0;
    for line in lines {
        let b = line.as_bytes();
        let mut j = 0;
        while j + 1 < b.len() && i < 256 {
            rom[OFFSET_FLAGS + i] = (hex_digit(b[j]) << 4) | hex_digit(b[j + 1]);
            i += 1;
            j += 2;
        }
    }
}

fn parse_map(lines: &[&str], rom: &mut Memory) {
    for (y, line) in lines.iter().enumerate().take(64) {
        let b = line.as_bytes();
        for x in 0..128 {
            let idx = x * 2;
            if idx + 1 < b.len() {
                let tile = (hex_digit(b[idx]) << 4) | hex_digit(b[idx + 1]);
                rom.set_map_tile(x as i32, y as i32, tile);
            }
        }
    }
}

/// One sound effect per line: 8 header digits, then 32 notes of 5 digits
/// (2 pitch, 1 waveform, 1 volume, 1 effect). The memory record is 68
/// bytes: 32 two-byte notes followed by the header bytes.
fn parse_sfx(lines: &[&str], rom: &mut Memory) {
    for (i, line) in lines.iter().enumerate().take(64) {
        let b = line.as_bytes();
        if b.len() < 8 {
            continue;
        }
        let base = OFFSET_SFX + i * 68;
        rom[base + 64] = (hex_digit(b[0]) << 4) | hex_digit(b[1]); // editor mode
        rom[base + 65] = (hex_digit(b[2]) << 4) | hex_digit(b[3]); // speed
        rom[base + 66] = (hex_digit(b[4]) << 4) | hex_digit(b[5]); // loop start
        rom[base + 67] = (hex_digit(b[6]) << 4) | hex_digit(b[7]); // loop end

        for n in 0..32 {
            let at = 8 + n * 5;
            if at + 5 > b.len() {
                break;
            }
            let pitch = ((hex_digit(b[at]) << 4) | hex_digit(b[at + 1])) & 0x3f;
            let wave = hex_digit(b[at + 2]);
            let volume = hex_digit(b[at + 3]) & 0x7;
            let effect = hex_digit(b[at + 4]) & 0x7;
            let word = pitch as u16
                | ((wave & 0x7) as u16) << 6
                | (volume as u16) << 9
                | (effect as u16) << 12
                | if wave >= 8 { 1 << 15 } else { 0 };
            rom[base + n * 2] = word as u8;
            rom[base + n * 2 + 1] = (word >> 8) as u8;
        }
    }
}

/// One pattern per line, `FF AABBCCDD`: the flag bits fold into the high
/// bits of the first three channel bytes.
fn parse_music(lines: &[&str], rom: &mut Memory) {
    for (i, line) in lines.iter().enumerate().take(64) {
        let digits: Vec<u8> = line
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        if digits.len() < 10 {
            continue;
        }
        let flags = (hex_digit(digits[0]) << 4) | hex_digit(digits[1]);
        for ch in 0..4 {
            let v = (hex_digit(digits[2 + ch * 2]) << 4) | hex_digit(digits[3 + ch * 2]);
            let flag_bit = if ch < 3 { (flags >> ch) & 1 } else { 0 };
            rom[OFFSET_SONG + i * 4 + ch] = (v & 0x7f) | (flag_bit << 7);
        }
    }
}

fn parse_label(lines: &[&str]) -> Vec<u8> {
    let mut label = vec![0u8; 128 * 128 * 4];
    for (y, line) in lines.iter().enumerate().take(128) {
        for (x, &c) in line.as_bytes().iter().enumerate().take(128) {
            let rgba = RGBA_PALETTE[(label_digit(c) & 0x1f) as usize];
            let base = (y * 128 + x) * 4;
            label[base..base + 4].copy_from_slice(&rgba);
        }
    }
    label
}

// ---------------------------------------------------------------------------
// Image format
// ---------------------------------------------------------------------------

impl Cart {
    /// Build a cart from decoded RGBA pixels. Each payload byte sits in the
    /// two low bits of four successive channels, R first; the ROM is the
    /// first 32 KiB, the next byte the version, and the code section lives
    /// at `OFFSET_CODE` inside the ROM.
    pub fn from_rgba(pixels: &[u8]) -> Result<Cart> {
        let count = pixels.len() / 4;
        if count <= MEM_SIZE {
            return Err(CoreError::BadCart(String::from("image too small")));
        }

        let mut data = Vec::with_capacity(count);
        for px in pixels.chunks_exact(4) {
            let byte =
                (px[0] & 3) | ((px[1] & 3) << 2) | ((px[2] & 3) << 4) | ((px[3] & 3) << 6);
            data.push(byte);
        }

        let mut rom = Memory::new();
        rom.as_bytes_mut().copy_from_slice(&data[..0x8000]);
        let version = data[0x8000] as i32;
        let code = code_from_rom(&rom);

        Ok(Cart {
            rom,
            code,
            lua: None,
            label: None,
            version,
        })
    }
}

/// Decode the code section of a ROM: compressed when it opens with the
/// magic, otherwise NUL-terminated charset bytes.
fn code_from_rom(rom: &Memory) -> String {
    let region = &rom.as_bytes()[OFFSET_CODE..];
    let charset = Charset::new();
    if region.starts_with(&CODE_MAGIC) {
        let len = u16::from_be_bytes([region[4], region[5]]) as usize;
        charset.decode(&decompress(&region[8..], len))
    } else {
        let end = region.iter().position(|&b| b == 0).unwrap_or(region.len());
        charset.decode(&region[..end])
    }
}

// ---------------------------------------------------------------------------
// Code compression
// ---------------------------------------------------------------------------

/// Decompress a code stream: 0x00 escapes a literal byte, 0x01..0x3b index
/// the look-up table, anything above is a back-reference whose offset and
/// length sit in the pair of bytes.
pub fn decompress(stream: &[u8], out_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(out_len);
    let mut i = 0;
    while out.len() < out_len && i < stream.len() {
        let b = stream[i];
        i += 1;
        match b {
            0x00 => {
                if i < stream.len() {
                    out.push(stream[i]);
                    i += 1;
                }
            }
            0x01..=0x3b => out.push(CODE_LUT[(b - 1) as usize]),
            _ => {
                if i >= stream.len() {
                    break;
                }
                let b2 = stream[i];
                i += 1;
                let offset = (b as usize - 0x3c) * 16 + (b2 & 0xf) as usize;
                let length = (b2 >> 4) as usize + 2;
                if offset == 0 || out.len() < offset {
                    break;
                }
                for _ in 0..length {
                    let c = out[out.len() - offset];
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Greedy longest-match compressor for the same stream format. Matches
/// shorter than 3 bytes are emitted as singles, which always round-trips
/// even when it costs a byte.
pub fn compress(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let window_start = pos.saturating_sub(CODE_WINDOW);
        let mut best_len = 0;
        let mut best_offset = 0;
        for start in window_start..pos {
            let mut len = 0;
            while len < 17 && pos + len < bytes.len() && bytes[start + len] == bytes[pos + len] {
                len += 1;
            }
            if len > best_len {
                best_len = len;
                best_offset = pos - start;
            }
        }

        if best_len >= 3 {
            out.push((best_offset / 16 + 0x3c) as u8);
            out.push(((best_offset & 0xf) | ((best_len - 2) << 4)) as u8);
            pos += best_len;
        } else {
            let c = bytes[pos];
            match CODE_LUT.iter().position(|&x| x == c) {
                Some(idx) => out.push(idx as u8 + 1),
                None => {
                    out.push(0);
                    out.push(c);
                }
            }
            pos += 1;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{OFFSET_MAP, OFFSET_MAP2};

    const SAMPLE: &str = "\
pico-8 cartridge // http://www.pico-8.com
version 8
__lua__
function _draw()
 cls()
end
__gfx__
12340000
__gff__
0102030405060708
__map__
0102030405
__sfx__
000110000c0500c0500c0500c050
__music__
01 41424344
";

    #[test]
    fn test_parse_version_and_code() {
        let cart = Cart::from_p8_text(SAMPLE);
        assert_eq!(cart.version(), 8);
        assert_eq!(cart.code(), "function _draw()\n cls()\nend");
    }

    #[test]
    fn test_parse_gfx_nibble_order() {
        let cart = Cart::from_p8_text(SAMPLE);
        // "1234" packs as 0x21, 0x43: first digit is the even column.
        assert_eq!(cart.rom().peek(0), 0x21);
        assert_eq!(cart.rom().peek(1), 0x43);
        assert_eq!(cart.rom().gfx_pixel(0, 0), 1);
        assert_eq!(cart.rom().gfx_pixel(1, 0), 2);
    }

    #[test]
    fn test_parse_gff_bytes() {
        let cart = Cart::from_p8_text(SAMPLE);
        for i in 0..8 {
            assert_eq!(cart.rom().sprite_flags(i), (i + 1) as u8);
        }
    }

    #[test]
    fn test_parse_map_row_zero() {
        let cart = Cart::from_p8_text(SAMPLE);
        assert_eq!(cart.rom().peek(OFFSET_MAP as i32), 0x01);
        assert_eq!(cart.rom().peek(OFFSET_MAP as i32 + 1), 0x02);
    }

    #[test]
    fn test_parse_map_rows_past_32_go_to_shared_region() {
        let mut src = String::from("version 1\n__map__\n");
        for _ in 0..32 {
            src.push_str("00\n");
        }
        src.push_str("ab\n");
        let cart = Cart::from_p8_text(&src);
        assert_eq!(cart.rom().peek(OFFSET_MAP2 as i32), 0xab);
        assert_eq!(cart.rom().map_tile(0, 32), 0xab);
    }

    #[test]
    fn test_parse_sfx_record_layout() {
        let cart = Cart::from_p8_text(SAMPLE);
        let base = OFFSET_SFX as i32;
        assert_eq!(cart.rom().peek(base + 64), 0x00, "editor mode byte");
        assert_eq!(cart.rom().peek(base + 65), 0x01, "speed byte");
        assert_eq!(cart.rom().peek(base + 66), 0x10, "loop start byte");
        assert_eq!(cart.rom().peek(base + 67), 0x00, "loop end byte");
        // First note: pitch 0x0c, wave 0, volume 5, effect 0.
        let lo = cart.rom().peek(base) as u16;
        let hi = cart.rom().peek(base + 1) as u16;
        let word = lo | (hi << 8);
        assert_eq!(word & 0x3f, 0x0c, "pitch");
        assert_eq!((word >> 6) & 0x7, 0, "waveform");
        assert_eq!((word >> 9) & 0x7, 5, "volume");
        assert_eq!((word >> 12) & 0x7, 0, "effect");
    }

    #[test]
    fn test_parse_music_flags_fold_into_channel_bits() {
        let cart = Cart::from_p8_text(SAMPLE);
        let base = OFFSET_SONG as i32;
        // Flags 0x01 set the loop-start bit on channel 0.
        assert_eq!(cart.rom().peek(base), 0x41 | 0x80);
        assert_eq!(cart.rom().peek(base + 1), 0x42);
        assert_eq!(cart.rom().peek(base + 2), 0x43);
        assert_eq!(cart.rom().peek(base + 3), 0x44);
    }

    #[test]
    fn test_parse_label_maps_extended_digits() {
        let src = "version 1\n__label__\n07gv\n";
        let cart = Cart::from_p8_text(src);
        let label = cart.label().expect("label present");
        assert_eq!(&label[0..4], &RGBA_PALETTE[0]);
        assert_eq!(&label[4..8], &RGBA_PALETTE[7]);
        assert_eq!(&label[8..12], &RGBA_PALETTE[16]);
        assert_eq!(&label[12..16], &RGBA_PALETTE[31]);
    }

    #[test]
    fn test_lua_fixup_is_memoized() {
        let mut cart = Cart::from_p8_text("version 1\n__lua__\nx += 1\n");
        assert_eq!(cart.lua(), "x = x + (1)\n");
        assert_eq!(cart.lua(), "x = x + (1)\n");
    }

    #[test]
    fn test_compress_round_trip() {
        let code = b"for i=1,10 do print(i) end -- loop loop loop loop";
        let stream = compress(code);
        assert_eq!(decompress(&stream, code.len()), code);
    }

    #[test]
    fn test_compress_handles_bytes_outside_the_table() {
        let code = b"X = \"HELLO\"; Y = 1"; // uppercase needs the escape
        let stream = compress(code);
        assert_eq!(decompress(&stream, code.len()), code);
    }

    #[test]
    fn test_compress_uses_back_references() {
        let code = b"abcabcabcabcabcabcabc";
        let stream = compress(code);
        assert!(stream.len() < code.len(), "repetition should shrink");
        assert_eq!(decompress(&stream, code.len()), code);
    }

    #[test]
    fn test_compressed_code_accessor_round_trips() {
        let cart = Cart::from_p8_text("version 1\n__lua__\nprint(\"hello\")\nprint(\"hello\")\n");
        let packed = cart.compressed_code();
        assert_eq!(&packed[0..4], &CODE_MAGIC);
        let len = u16::from_be_bytes([packed[4], packed[5]]) as usize;
        let decoded = decompress(&packed[8..], len);
        assert_eq!(Charset::new().decode(&decoded), cart.code());
    }

    #[test]
    fn test_from_rgba_extracts_payload() {
        // 160x205 worth of pixels, enough for the ROM plus version + code.
        let count = 160 * 205;
        let mut data = vec![0u8; count];
        data[0] = 0x12;
        data[0x42ff] = 0x34;
        data[0x8000] = 9; // version
        for (i, &b) in b"print(1)\0".iter().enumerate() {
            data[OFFSET_CODE + i] = b;
        }

        let mut pixels = vec![0u8; count * 4];
        for (i, &b) in data.iter().enumerate() {
            pixels[i * 4] = b & 3;
            pixels[i * 4 + 1] = (b >> 2) & 3;
            pixels[i * 4 + 2] = (b >> 4) & 3;
            pixels[i * 4 + 3] = (b >> 6) & 3;
        }

        let cart = Cart::from_rgba(&pixels).expect("valid image");
        assert_eq!(cart.rom().peek(0), 0x12);
        assert_eq!(cart.rom().peek(0x42ff), 0x34);
        assert_eq!(cart.version(), 9);
        assert_eq!(cart.code(), "print(1)");
    }

    #[test]
    fn test_from_rgba_rejects_small_images() {
        let pixels = vec![0u8; 128 * 128 * 4];
        assert!(Cart::from_rgba(&pixels).is_err());
    }

    #[test]
    fn test_from_rgba_decodes_compressed_code() {
        let count = 0x8001;
        let mut data = vec![0u8; count];
        let code = b"print(1)\nprint(1)\n";
        let stream = compress(code);
        data[OFFSET_CODE..OFFSET_CODE + 4].copy_from_slice(&CODE_MAGIC);
        data[OFFSET_CODE + 4..OFFSET_CODE + 6].copy_from_slice(&(code.len() as u16).to_be_bytes());
        data[OFFSET_CODE + 8..OFFSET_CODE + 8 + stream.len()].copy_from_slice(&stream);

        let mut pixels = vec![0u8; count * 4];
        for (i, &b) in data.iter().enumerate() {
            pixels[i * 4] = b & 3;
            pixels[i * 4 + 1] = (b >> 2) & 3;
            pixels[i * 4 + 2] = (b >> 4) & 3;
            pixels[i * 4 + 3] = (b >> 6) & 3;
        }

        let cart = Cart::from_rgba(&pixels).expect("valid image");
        assert_eq!(cart.code().as_bytes(), code);
    }
}
