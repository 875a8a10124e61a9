// gfx.rs — the rendering kernel.
//
// Every primitive funnels into set_pixel(), which takes a packed 32-bit
// color-bits word:
//
//   bits[0:16]  16-pixel fill pattern, row-major 4x4
//   bits[16:20] primary color index (already palette-remapped)
//   bits[20:24] secondary color index (already palette-remapped)
//   bits[24]    pattern transparency: secondary pixels are skipped
//
// Coordinates are fixed-point; the camera offset is subtracted and the
// value truncated before touching memory. The clip rectangle is closed on
// the low side and open on the high side.

use crate::fix32::Fix32;
use crate::font;
use crate::memory::{OFFSET_SCREEN, SIZE_SCREEN};
use crate::Console;

const F1: Fix32 = Fix32::ONE;
const F128: Fix32 = Fix32::from_i32(128);

#[derive(Clone)]
pub struct DrawState {
    /// Current pen word. The low nibble of the integer part is the primary
    /// color, the next nibble the secondary; integer bit 8 is the raw
    /// sentinel (the pen's own pattern and transparency bits are used
    /// verbatim instead of the fill pattern's).
    pub pen: Fix32,
    /// Current fill pattern word: the integer part is the 4x4 pattern, the
    /// 0.5 fraction bit enables pattern transparency.
    pub fillp: Fix32,
    pub clip_x0: Fix32,
    pub clip_y0: Fix32,
    pub clip_x1: Fix32,
    pub clip_y1: Fix32,
    pub camera_x: Fix32,
    pub camera_y: Fix32,
    pub cursor_x: Fix32,
    pub cursor_y: Fix32,
    /// Remap tables: `pal[0]` is the draw palette, `pal[1]` the screen
    /// palette consumed by the display front-end.
    pub pal: [[u8; 16]; 2],
    /// Per-index transparency for sprite and map blits.
    pub palt: [bool; 16],
}

impl Default for DrawState {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawState {
    const IDENTITY: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

    pub fn new() -> Self {
        let mut palt = [false; 16];
        palt[0] = true;
        DrawState {
            pen: Fix32::from_i32(6),
            fillp: Fix32::ZERO,
            clip_x0: Fix32::ZERO,
            clip_y0: Fix32::ZERO,
            clip_x1: F128,
            clip_y1: F128,
            camera_x: Fix32::ZERO,
            camera_y: Fix32::ZERO,
            cursor_x: Fix32::ZERO,
            cursor_y: Fix32::ZERO,
            pal: [Self::IDENTITY; 2],
            palt,
        }
    }

    /// `pal()` with no arguments: identity tables, default transparency,
    /// fill pattern cleared.
    pub fn reset_palettes(&mut self) {
        self.pal = [Self::IDENTITY; 2];
        self.reset_transparency();
        self.fillp = Fix32::ZERO;
    }

    /// `palt()` with no arguments: only color 0 is transparent.
    pub fn reset_transparency(&mut self) {
        for (i, t) in self.palt.iter_mut().enumerate() {
            *t = i == 0;
        }
    }

    /// Compose the color-bits word from the pen and fill pattern.
    pub fn color_bits(&self) -> u32 {
        let pen = self.pen.bits() as u32;
        let c1 = (pen >> 16) & 0xf;
        let c2 = (pen >> 20) & 0xf;

        let mut bits: u32 = 0;
        if pen & 0x0100_0000 != 0 {
            bits |= pen & 0x0100_ffff;
        } else {
            let fp = self.fillp.bits() as u32;
            bits |= (fp >> 16) & 0xffff;
            bits |= (fp << 9) & 0x0100_0000;
        }

        bits |= (self.pal[0][c1 as usize] as u32) << 16;
        bits |= (self.pal[0][c2 as usize] as u32) << 20;
        bits
    }
}

// ---------------------------------------------------------------------------
// Pixel kernel
// ---------------------------------------------------------------------------

impl Console {
    /// Write one pixel at post-camera coordinates through the clip test,
    /// the fill pattern and the packed framebuffer.
    pub fn set_pixel(&mut self, x: Fix32, y: Fix32, color_bits: u32) {
        let d = &self.draw;
        if x < d.clip_x0 || x >= d.clip_x1 || y < d.clip_y0 || y >= d.clip_y1 {
            return;
        }

        let (xi, yi) = (x.to_i32(), y.to_i32());
        let mut color = ((color_bits >> 16) & 0xf) as u8;
        if (color_bits >> ((xi & 3) + 4 * (yi & 3))) & 1 != 0 {
            if color_bits & 0x0100_0000 != 0 {
                return;
            }
            color = ((color_bits >> 20) & 0xf) as u8;
        }

        self.mem.set_screen_pixel(xi, yi, color);
    }

    /// Read one pixel at post-camera coordinates; outside the clip reads 0.
    pub fn get_pixel(&self, x: Fix32, y: Fix32) -> u8 {
        let d = &self.draw;
        if x < d.clip_x0 || x >= d.clip_x1 || y < d.clip_y0 || y >= d.clip_y1 {
            return 0;
        }
        self.mem.screen_pixel(x.to_i32(), y.to_i32())
    }

    fn hline(&mut self, mut x1: Fix32, mut x2: Fix32, y: Fix32, color_bits: u32) {
        if x1 > x2 {
            core::mem::swap(&mut x1, &mut x2);
        }

        if color_bits & 0xffff != 0 {
            let mut x = x1;
            while x <= x2 {
                self.set_pixel(x, y, color_bits);
                if x.bits() > i32::MAX - 0x10000 {
                    break;
                }
                x = x + F1;
            }
            return;
        }

        if y < self.draw.clip_y0 || y >= self.draw.clip_y1 {
            return;
        }

        let mut x1 = x1.max(self.draw.clip_x0);
        let mut x2 = x2.min(self.draw.clip_x1 - F1);
        if x1 > x2 {
            return;
        }

        let color = ((color_bits >> 16) & 0xf) as u8;
        let row = OFFSET_SCREEN + (128 * y.to_i32() as usize) / 2;

        if x1.to_i32() & 1 == 1 {
            let offset = row + (x1.to_i32() / 2) as usize;
            self.mem[offset] = (self.mem[offset] & 0x0f) | (color << 4);
            x1 = x1 + F1;
        }

        if x2.to_i32() & 1 == 0 {
            let offset = row + (x2.to_i32() / 2) as usize;
            self.mem[offset] = (self.mem[offset] & 0xf0) | color;
            x2 = x2 - F1;
        }

        let (a, b) = (x1.to_i32(), x2.to_i32());
        if a <= b {
            let start = row + (a / 2) as usize;
            let count = ((b - a + 1) / 2) as usize;
            self.mem.as_bytes_mut()[start..start + count].fill(color * 0x11);
        }
    }

    fn vline(&mut self, x: Fix32, mut y1: Fix32, mut y2: Fix32, color_bits: u32) {
        if y1 > y2 {
            core::mem::swap(&mut y1, &mut y2);
        }

        if color_bits & 0xffff != 0 {
            let mut y = y1;
            while y <= y2 {
                self.set_pixel(x, y, color_bits);
                if y.bits() > i32::MAX - 0x10000 {
                    break;
                }
                y = y + F1;
            }
            return;
        }

        if x < self.draw.clip_x0 || x >= self.draw.clip_x1 {
            return;
        }

        let y1 = y1.max(self.draw.clip_y0);
        let y2 = y2.min(self.draw.clip_y1 - F1);
        if y1 > y2 {
            return;
        }

        let color = ((color_bits >> 16) & 0xf) as u8;
        let xi = x.to_i32();
        let (mask, p) = if xi & 1 == 1 {
            (0x0f, color << 4)
        } else {
            (0xf0, color)
        };

        for y in y1.to_i32()..=y2.to_i32() {
            let offset = OFFSET_SCREEN + (128 * y as usize + xi as usize) / 2;
            self.mem[offset] = (self.mem[offset] & mask) | p;
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing state
// ---------------------------------------------------------------------------

impl Console {
    pub fn camera(&mut self, x: Fix32, y: Fix32) {
        self.draw.camera_x = x;
        self.draw.camera_y = y;
    }

    /// `clip(x, y, w, h)`; `None` resets to the full screen. The rectangle
    /// is clamped to [0,128] on both corners.
    pub fn clip(&mut self, rect: Option<(Fix32, Fix32, Fix32, Fix32)>) {
        match rect {
            None => {
                self.draw.clip_x0 = Fix32::ZERO;
                self.draw.clip_y0 = Fix32::ZERO;
                self.draw.clip_x1 = F128;
                self.draw.clip_y1 = F128;
            }
            Some((x, y, w, h)) => {
                self.draw.clip_x0 = x.max(Fix32::ZERO).min(F128);
                self.draw.clip_y0 = y.max(Fix32::ZERO).min(F128);
                self.draw.clip_x1 = (x + w).max(Fix32::ZERO).min(F128);
                self.draw.clip_y1 = (y + h).max(Fix32::ZERO).min(F128);
            }
        }
    }

    pub fn color(&mut self, c: Fix32) {
        self.draw.pen = c;
    }

    pub fn fillp(&mut self, p: Fix32) {
        self.draw.fillp = p;
    }

    pub fn cursor(&mut self, x: Fix32, y: Fix32) {
        self.draw.cursor_x = x;
        self.draw.cursor_y = y;
    }

    /// `pal(c0, c1, p)`; `None` resets both tables, transparency and the
    /// fill pattern.
    pub fn pal(&mut self, args: Option<(Fix32, Fix32, Fix32)>) {
        match args {
            None => self.draw.reset_palettes(),
            Some((c0, c1, p)) => {
                let table = (p.to_i32() & 1) as usize;
                self.draw.pal[table][(c0.to_i32() & 0xf) as usize] = (c1.to_i32() & 0xf) as u8;
            }
        }
    }

    /// `palt(c, t)`; `None` resets to color 0 transparent.
    pub fn palt(&mut self, args: Option<(Fix32, bool)>) {
        match args {
            None => self.draw.reset_transparency(),
            Some((c, t)) => self.draw.palt[(c.to_i32() & 0xf) as usize] = t,
        }
    }
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

impl Console {
    pub fn cls(&mut self, col: Fix32) {
        let c = (col.to_i32() & 0xf) as u8;
        self.mem.screen_mut().fill(c * 0x11);
        self.draw.cursor_x = Fix32::ZERO;
        self.draw.cursor_y = Fix32::ZERO;
    }

    pub fn pset(&mut self, x: Fix32, y: Fix32, col: Option<Fix32>) {
        let x = x - self.draw.camera_x;
        let y = y - self.draw.camera_y;
        if let Some(c) = col {
            self.draw.pen = c;
        }
        let bits = self.draw.color_bits();
        self.set_pixel(x, y, bits);
    }

    /// Subject to camera and clip; does not apply the screen palette.
    pub fn pget(&self, x: Fix32, y: Fix32) -> u8 {
        let x = x - self.draw.camera_x;
        let y = y - self.draw.camera_y;
        self.get_pixel(x, y)
    }

    pub fn line(&mut self, x0: Fix32, y0: Fix32, x1: Fix32, y1: Fix32, col: Option<Fix32>) {
        let x0 = (x0 - self.draw.camera_x).floor();
        let y0 = (y0 - self.draw.camera_y).floor();
        let x1 = (x1 - self.draw.camera_x).floor();
        let y1 = (y1 - self.draw.camera_y).floor();
        if let Some(c) = col {
            self.draw.pen = c;
        }
        let bits = self.draw.color_bits();

        // Interpolation runs in f64 on both axes.
        let mix = |a: Fix32, b: Fix32, t: f64| -> i32 {
            let a = a.to_f64();
            let b = b.to_f64();
            libm::round(a + (b - a) * t) as i32
        };

        if x0 == x1 && y0 == y1 {
            self.set_pixel(x0, y0, bits);
        } else if (x1 - x0).abs() > (y1 - y0).abs() {
            let (xa, xb) = (x0.min(x1).to_i32(), x0.max(x1).to_i32());
            for x in xa..=xb {
                let t = (x as f64 - x0.to_f64()) / (x1 - x0).to_f64();
                let y = mix(y0, y1, t);
                self.set_pixel(Fix32::from_i32(x), Fix32::from_i32(y), bits);
            }
        } else {
            let (ya, yb) = (y0.min(y1).to_i32(), y0.max(y1).to_i32());
            for y in ya..=yb {
                let t = (y as f64 - y0.to_f64()) / (y1 - y0).to_f64();
                let x = mix(x0, x1, t);
                self.set_pixel(Fix32::from_i32(x), Fix32::from_i32(y), bits);
            }
        }
    }

    pub fn rect(&mut self, x0: Fix32, y0: Fix32, x1: Fix32, y1: Fix32, col: Option<Fix32>) {
        let mut x0 = x0 - self.draw.camera_x;
        let mut y0 = y0 - self.draw.camera_y;
        let mut x1 = x1 - self.draw.camera_x;
        let mut y1 = y1 - self.draw.camera_y;
        if let Some(c) = col {
            self.draw.pen = c;
        }
        let bits = self.draw.color_bits();

        if x0 > x1 {
            core::mem::swap(&mut x0, &mut x1);
        }
        if y0 > y1 {
            core::mem::swap(&mut y0, &mut y1);
        }

        self.hline(x0, x1, y0, bits);
        self.hline(x0, x1, y1, bits);

        // The vertical sides are shortened by one on each end to avoid
        // writing the corner pixels twice.
        if y0 + F1 < y1 {
            self.vline(x0, y0 + F1, y1 - F1, bits);
            self.vline(x1, y0 + F1, y1 - F1, bits);
        }
    }

    pub fn rectfill(&mut self, x0: Fix32, y0: Fix32, x1: Fix32, y1: Fix32, col: Option<Fix32>) {
        let x0 = x0 - self.draw.camera_x;
        let mut y0 = y0 - self.draw.camera_y;
        let x1 = x1 - self.draw.camera_x;
        let mut y1 = y1 - self.draw.camera_y;
        if let Some(c) = col {
            self.draw.pen = c;
        }
        let bits = self.draw.color_bits();

        if y0 > y1 {
            core::mem::swap(&mut y0, &mut y1);
        }

        for y in y0.floor().to_i32()..=y1.floor().to_i32() {
            self.hline(x0, x1, Fix32::from_i32(y), bits);
        }
    }

    pub fn circ(&mut self, x: Fix32, y: Fix32, r: Fix32, col: Option<Fix32>) {
        let x = x - self.draw.camera_x;
        let y = y - self.draw.camera_y;
        let r = r.to_i32();
        if let Some(c) = col {
            self.draw.pen = c;
        }
        let bits = self.draw.color_bits();

        let (mut dx, mut dy, mut err) = (r, 0i32, 0i32);
        while dx >= dy {
            let (fdx, fdy) = (Fix32::from_i32(dx), Fix32::from_i32(dy));

            self.set_pixel(x + fdx, y + fdy, bits);
            self.set_pixel(x + fdy, y + fdx, bits);
            self.set_pixel(x - fdy, y + fdx, bits);
            self.set_pixel(x - fdx, y + fdy, bits);
            self.set_pixel(x - fdx, y - fdy, bits);
            self.set_pixel(x - fdy, y - fdx, bits);
            self.set_pixel(x + fdy, y - fdx, bits);
            self.set_pixel(x + fdx, y - fdy, bits);

            dy += 1;
            err += 1 + 2 * dy;
            // Adjusted midpoint step; the textbook test rounds differently.
            if 2 * (err - dx) > r + 1 {
                dx -= 1;
                err += 1 - 2 * dx;
            }
        }
    }

    pub fn circfill(&mut self, x: Fix32, y: Fix32, r: Fix32, col: Option<Fix32>) {
        let x = x - self.draw.camera_x;
        let y = y - self.draw.camera_y;
        let r = r.to_i32();
        if let Some(c) = col {
            self.draw.pen = c;
        }
        let bits = self.draw.color_bits();

        let (mut dx, mut dy, mut err) = (r, 0i32, 0i32);
        while dx >= dy {
            let (fdx, fdy) = (Fix32::from_i32(dx), Fix32::from_i32(dy));

            // Minor overdraw between the spans; harmless.
            self.hline(x - fdx, x + fdx, y - fdy, bits);
            self.hline(x - fdx, x + fdx, y + fdy, bits);
            self.vline(x - fdy, y - fdx, y + fdx, bits);
            self.vline(x + fdy, y - fdx, y + fdx, bits);

            dy += 1;
            err += 1 + 2 * dy;
            if 2 * (err - dx) > r + 1 {
                dx -= 1;
                err += 1 - 2 * dx;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Sprite and map blits
// ---------------------------------------------------------------------------

impl Console {
    /// Draw sprite `n` at (x, y), spanning w x h sprite cells (8 px each).
    pub fn spr(
        &mut self,
        n: i32,
        x: Fix32,
        y: Fix32,
        w: Option<Fix32>,
        h: Option<Fix32>,
        flip_x: bool,
        flip_y: bool,
    ) {
        let x = x - self.draw.camera_x;
        let y = y - self.draw.camera_y;
        let w8 = w.map_or(8, |v| (v * Fix32::from_i32(8)).to_i32());
        let h8 = h.map_or(8, |v| (v * Fix32::from_i32(8)).to_i32());

        for j in 0..h8 {
            for i in 0..w8 {
                let di = if flip_x { w8 - 1 - i } else { i };
                let dj = if flip_y { h8 - 1 - j } else { j };
                let col = self.mem.gfx_pixel(n % 16 * 8 + di, n / 16 * 8 + dj);
                if !self.draw.palt[col as usize] {
                    let bits = (self.draw.pal[0][col as usize] as u32) << 16;
                    self.set_pixel(x + Fix32::from_i32(i), y + Fix32::from_i32(j), bits);
                }
            }
        }
    }

    /// Stretch-blit a sheet rectangle to a screen rectangle, nearest
    /// neighbor, with flips.
    #[allow(clippy::too_many_arguments)]
    pub fn sspr(
        &mut self,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        dx: Fix32,
        dy: Fix32,
        dw: Option<i32>,
        dh: Option<i32>,
        flip_x: bool,
        flip_y: bool,
    ) {
        let dx = dx - self.draw.camera_x;
        let dy = dy - self.draw.camera_y;
        let dw = dw.unwrap_or(sw);
        let dh = dh.unwrap_or(sh);

        for j in 0..dh {
            for i in 0..dw {
                let di = if flip_x { dw - 1 - i } else { i };
                let dj = if flip_y { dh - 1 - j } else { j };

                let x = sx + sw * di / dw;
                let y = sy + sh * dj / dh;

                let col = self.mem.gfx_pixel(x, y);
                if !self.draw.palt[col as usize] {
                    let bits = (self.draw.pal[0][col as usize] as u32) << 16;
                    self.set_pixel(dx + Fix32::from_i32(i), dy + Fix32::from_i32(j), bits);
                }
            }
        }
    }

    /// Blit a map region. With a non-zero `layer`, tiles whose flags lack
    /// all requested bits are skipped; tile 0 is never drawn.
    pub fn map_draw(
        &mut self,
        cel_x: i32,
        cel_y: i32,
        sx: Fix32,
        sy: Fix32,
        size: Option<(i32, i32)>,
        layer: u8,
    ) {
        let sx = sx - self.draw.camera_x;
        let sy = sy - self.draw.camera_y;
        let (cel_w, cel_h) = size.unwrap_or((128, 32));

        for dy in 0..cel_h * 8 {
            for dx in 0..cel_w * 8 {
                let cx = cel_x + dx / 8;
                let cy = cel_y + dy / 8;
                if !(0..128).contains(&cx) || !(0..64).contains(&cy) {
                    continue;
                }

                let sprite = self.mem.map_tile(cx, cy);
                let flags = self.mem.sprite_flags(sprite as i32);
                if layer != 0 && flags & layer == 0 {
                    continue;
                }

                if sprite != 0 {
                    let col = self
                        .mem
                        .gfx_pixel(sprite as i32 % 16 * 8 + dx % 8, sprite as i32 / 16 * 8 + dy % 8);
                    if !self.draw.palt[col as usize] {
                        let bits = (self.draw.pal[0][(col & 0xf) as usize] as u32) << 16;
                        self.set_pixel(sx + Fix32::from_i32(dx), sy + Fix32::from_i32(dy), bits);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

impl Console {
    fn glyph_pixel(index: usize, dx: i32, dy: i32) -> bool {
        if index < 0x60 {
            dy < 5 && font::FONT[index][dy as usize] & (0x08 >> dx) != 0
        } else {
            font::FONT_WIDE[index - 0x60][dy as usize] & (0x80 >> dx) != 0
        }
    }

    /// Print text with the bitmap font. Without a position the text cursor
    /// is used and the screen scrolls up by one line height once the cursor
    /// passes y = 116. With a color argument the pen is updated.
    pub fn print(&mut self, text: &str, pos: Option<(Fix32, Fix32)>, col: Option<Fix32>) {
        let bytes = self.charset.encode(text);

        let use_cursor = pos.is_none();
        let (mut x, mut y) = pos.unwrap_or((self.draw.cursor_x, self.draw.cursor_y));
        if let Some(c) = col {
            self.draw.pen = c;
        }
        let initial_x = x;
        let bits = self.draw.color_bits();
        let line_height = Fix32::from_i32(font::CHAR_H);

        for &ch in &bytes {
            if ch == b'\n' {
                x = initial_x;
                y = y + line_height;
                continue;
            }

            let index = if ch > 0x20 && ch < 0xa0 {
                ch as usize - 0x20
            } else {
                0
            };
            let w = if index < 0x60 { font::CHAR_W } else { font::WIDE_W };

            for dy in 0..font::CHAR_H {
                for dx in 0..w {
                    if Self::glyph_pixel(index, dx, dy) {
                        let px = x - self.draw.camera_x + Fix32::from_i32(dx);
                        let py = y - self.draw.camera_y + Fix32::from_i32(dy);
                        self.set_pixel(px, py, bits);
                    }
                }
            }

            // The comma kerns the rest of the line back by one pixel.
            let advance = if ch == b',' { w - 1 } else { w };
            x = x + Fix32::from_i32(advance);
        }

        // Scrolling happens once, after the whole string is printed.
        if use_cursor {
            let lines = font::CHAR_H as usize;
            if y > Fix32::from_i32(116) {
                let screen = self.mem.screen_mut();
                screen.copy_within(lines * 64.., 0);
                screen[SIZE_SCREEN - lines * 64..].fill(0);
                y = y - line_height;
            }
            self.draw.cursor_x = initial_x;
            self.draw.cursor_y = y + line_height;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
