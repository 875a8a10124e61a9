// console.rs — the live machine state: memory image, drawing state, input,
// audio channels and the loaded cartridge.

use alloc::string::String;

use crate::cart::Cart;
use crate::charset::Charset;
use crate::fix32::Fix32;
use crate::gfx::DrawState;
use crate::input::Buttons;
use crate::memory::Memory;
use crate::Result;

/// Display palette as RGBA bytes: the 16 base colors followed by the 16
/// extended colors used by cart labels.
pub const RGBA_PALETTE: [[u8; 4]; 32] = [
    [0, 0, 0, 255],
    [29, 43, 83, 255],
    [126, 37, 83, 255],
    [0, 135, 81, 255],
    [171, 82, 54, 255],
    [95, 87, 79, 255],
    [194, 195, 199, 255],
    [255, 241, 232, 255],
    [255, 0, 77, 255],
    [255, 163, 0, 255],
    [255, 236, 39, 255],
    [0, 228, 54, 255],
    [41, 173, 255, 255],
    [131, 118, 156, 255],
    [255, 119, 168, 255],
    [255, 204, 170, 255],
    [41, 24, 20, 255],
    [17, 29, 53, 255],
    [66, 33, 54, 255],
    [18, 83, 89, 255],
    [116, 47, 41, 255],
    [73, 51, 59, 255],
    [162, 136, 121, 255],
    [243, 239, 125, 255],
    [190, 18, 80, 255],
    [255, 108, 36, 255],
    [168, 231, 46, 255],
    [0, 181, 67, 255],
    [6, 90, 181, 255],
    [117, 70, 101, 255],
    [255, 110, 89, 255],
    [255, 157, 129, 255],
];

/// One audio channel slot: the sound effect it is playing and the row the
/// sequencer is on, or -1 when idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Channel {
    pub sfx: i32,
    pub row: i32,
}

impl Channel {
    pub const IDLE: Channel = Channel { sfx: -1, row: -1 };
}

pub struct Console {
    pub mem: Memory,
    pub draw: DrawState,
    pub buttons: Buttons,
    pub channels: [Channel; 4],
    pub music_pattern: i32,
    pub charset: Charset,
    pub cart: Option<Cart>,

    // Mouse state, written by the embedder, read back through stat().
    pub mouse_x: Fix32,
    pub mouse_y: Fix32,
    pub mouse_buttons: Fix32,

    cartdata: Option<String>,
    rng: u64,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Console {
            mem: Memory::new(),
            draw: DrawState::new(),
            buttons: Buttons::new(),
            channels: [Channel::IDLE; 4],
            music_pattern: -1,
            charset: Charset::new(),
            cart: None,
            mouse_x: Fix32::ZERO,
            mouse_y: Fix32::ZERO,
            mouse_buttons: Fix32::ZERO,
            cartdata: None,
            rng: 0xdead_beef_cafe_1234,
        }
    }

    /// Copy the cart ROM into live memory; see `Memory::load_from`.
    /// Without a loaded cart this is a no-op.
    pub fn reload(&mut self, dst: i32, src: i32, len: i32) -> Result<()> {
        let Console { mem, cart, .. } = self;
        match cart {
            Some(cart) => mem.load_from(cart.rom(), dst, src, len),
            None => Ok(()),
        }
    }

    /// Convert the framebuffer to RGBA through the screen palette.
    /// `out` must hold at least 128*128*4 bytes.
    pub fn screen_rgba(&self, out: &mut [u8]) {
        for y in 0..128 {
            for x in 0..128 {
                let c = self.mem.screen_pixel(x, y);
                let mapped = self.draw.pal[1][(c & 0xf) as usize] & 0xf;
                let rgba = RGBA_PALETTE[mapped as usize];
                let base = (y as usize * 128 + x as usize) * 4;
                out[base..base + 4].copy_from_slice(&rgba);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Sprite flags, map and sheet accessors
// ---------------------------------------------------------------------------

impl Console {
    pub fn fget(&self, n: i32) -> u8 {
        self.mem.sprite_flags(n)
    }

    /// With `v`, sets or clears bit `f`; without, overwrites the whole byte.
    pub fn fset(&mut self, n: i32, f: i32, v: Option<bool>) {
        if n < 0 || n >= 256 {
            return;
        }
        let mut bits = self.mem.sprite_flags(n);
        match v {
            None => bits = f as u8,
            Some(on) => {
                if !(0..8).contains(&f) {
                    return;
                }
                if on {
                    bits |= 1 << f;
                } else {
                    bits &= !(1 << f);
                }
            }
        }
        self.mem.set_sprite_flags(n, bits);
    }

    pub fn mget(&self, x: i32, y: i32) -> u8 {
        self.mem.map_tile(x, y)
    }

    pub fn mset(&mut self, x: i32, y: i32, tile: u8) {
        self.mem.set_map_tile(x, y, tile);
    }

    pub fn sget(&self, x: i32, y: i32) -> u8 {
        self.mem.gfx_pixel(x, y)
    }

    /// Writes through the draw palette; a missing color uses the pen.
    pub fn sset(&mut self, x: i32, y: i32, col: Option<Fix32>) {
        let col = col.unwrap_or(self.draw.pen);
        let c = self.draw.pal[0][(col.to_i32() & 0xf) as usize];
        self.mem.set_gfx_pixel(x, y, c);
    }
}

// ---------------------------------------------------------------------------
// Audio channel state
// ---------------------------------------------------------------------------

impl Console {
    /// `sfx(n, channel, offset)`. -1 stops the channel, -2 releases its loop
    /// (the sequencer itself lives in the embedder's audio layer).
    pub fn sfx(&mut self, n: i32, channel: i32, offset: i32) {
        match n {
            -1 => {
                if (0..4).contains(&channel) {
                    self.channels[channel as usize] = Channel::IDLE;
                }
            }
            -2 => {
                log::info!("stub: sfx(-2,{})", channel);
            }
            0..=63 => {
                let ch = if (0..4).contains(&channel) {
                    channel as usize
                } else {
                    self.channels.iter().position(|c| c.sfx < 0).unwrap_or(3)
                };
                self.channels[ch] = Channel {
                    sfx: n,
                    row: offset.clamp(0, 31),
                };
            }
            _ => {}
        }
    }

    /// `music(n)`: -1 stops, anything else selects a pattern.
    pub fn music(&mut self, n: i32) {
        self.music_pattern = if n < 0 { -1 } else { n & 63 };
    }
}

// ---------------------------------------------------------------------------
// Persistent data tag and RNG
// ---------------------------------------------------------------------------

impl Console {
    /// `cartdata(id)`: no argument reports whether an id is set, an empty
    /// string clears it, anything else stores it.
    pub fn cartdata(&mut self, id: Option<&str>) -> Option<bool> {
        match id {
            None => Some(self.cartdata.is_some()),
            Some("") => {
                self.cartdata = None;
                None
            }
            Some(s) => {
                self.cartdata = Some(String::from(s));
                log::info!("stub: cartdata({:?})", s);
                Some(false)
            }
        }
    }

    /// `rnd(x)`: uniform in [0, x); non-positive ranges return 0.
    pub fn rnd(&mut self, range: Fix32) -> Fix32 {
        let r = self.next_random();
        if range <= Fix32::ZERO {
            return Fix32::ZERO;
        }
        Fix32::from_bits((r % range.bits() as u64) as i32)
    }

    pub fn srand(&mut self, seed: Fix32) {
        self.rng = (seed.bits() as u32 as u64) ^ 0xdead_beef_cafe_1234;
    }

    fn next_random(&mut self) -> u64 {
        let mut s = self.rng;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.rng = s;
        s
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fset_whole_byte_and_single_bit() {
        let mut con = Console::new();
        con.fset(3, 0xa5, None);
        assert_eq!(con.fget(3), 0xa5);
        con.fset(3, 1, Some(true));
        assert_eq!(con.fget(3), 0xa7);
        con.fset(3, 0, Some(false));
        assert_eq!(con.fget(3), 0xa6);
        con.fset(3, 9, Some(true)); // out-of-range bit is ignored
        assert_eq!(con.fget(3), 0xa6);
        con.fset(300, 0xff, None); // out-of-range sprite is ignored
        assert_eq!(con.fget(300), 0);
    }

    #[test]
    fn test_sset_goes_through_draw_palette() {
        let mut con = Console::new();
        con.draw.pal[0][7] = 9;
        con.sset(0, 0, Some(Fix32::from_i32(7)));
        assert_eq!(con.sget(0, 0), 9, "sset should remap through pal[0]");
    }

    #[test]
    fn test_sset_defaults_to_pen() {
        let mut con = Console::new();
        con.draw.pen = Fix32::from_i32(12);
        con.sset(5, 5, None);
        assert_eq!(con.sget(5, 5), 12);
    }

    #[test]
    fn test_sfx_channel_selection() {
        let mut con = Console::new();
        con.sfx(7, -1, 0);
        assert_eq!(con.channels[0], Channel { sfx: 7, row: 0 });
        con.sfx(8, -1, 5);
        assert_eq!(con.channels[1], Channel { sfx: 8, row: 5 });
        con.sfx(9, 0, 0);
        assert_eq!(con.channels[0].sfx, 9, "explicit channel wins");
        con.sfx(-1, 0, 0);
        assert_eq!(con.channels[0], Channel::IDLE);
    }

    #[test]
    fn test_sfx_all_busy_takes_last_channel() {
        let mut con = Console::new();
        for i in 0..4 {
            con.sfx(i, i, 0);
        }
        con.sfx(42, -1, 0);
        assert_eq!(con.channels[3].sfx, 42);
    }

    #[test]
    fn test_music_pattern_state() {
        let mut con = Console::new();
        con.music(12);
        assert_eq!(con.music_pattern, 12);
        con.music(-1);
        assert_eq!(con.music_pattern, -1);
    }

    #[test]
    fn test_cartdata_lifecycle() {
        let mut con = Console::new();
        assert_eq!(con.cartdata(None), Some(false));
        assert_eq!(con.cartdata(Some("my_cart")), Some(false));
        assert_eq!(con.cartdata(None), Some(true));
        assert_eq!(con.cartdata(Some("")), None);
        assert_eq!(con.cartdata(None), Some(false));
    }

    #[test]
    fn test_rnd_stays_in_range_and_is_seedable() {
        let mut con = Console::new();
        let range = Fix32::from_i32(10);
        for _ in 0..100 {
            let v = con.rnd(range);
            assert!(v >= Fix32::ZERO && v < range);
        }
        assert_eq!(con.rnd(Fix32::ZERO), Fix32::ZERO);

        con.srand(Fix32::from_i32(99));
        let a = con.rnd(range);
        con.srand(Fix32::from_i32(99));
        let b = con.rnd(range);
        assert_eq!(a, b, "same seed, same sequence");
    }

    #[test]
    fn test_screen_rgba_applies_screen_palette() {
        let mut con = Console::new();
        con.mem.set_screen_pixel(0, 0, 8);
        con.draw.pal[1][8] = 12;
        let mut out = [0u8; 128 * 128 * 4];
        con.screen_rgba(&mut out);
        assert_eq!(&out[0..4], &RGBA_PALETTE[12]);
    }
}
