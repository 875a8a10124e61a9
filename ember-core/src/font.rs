// font.rs — glyph bitmaps for the text renderer.
//
// Narrow glyphs cover 0x20..0x7f in a 4x6 cell (4 columns, rows 0..4 used);
// wide glyphs cover 0x80..0x9f in an 8x6 cell. Row bytes store the leftmost
// column in the highest bit (0x08 for narrow, 0x80 for wide). Line height
// is 6 pixels.

pub const CHAR_W: i32 = 4;
pub const WIDE_W: i32 = 8;
pub const CHAR_H: i32 = 6;

/// Narrow glyphs, indices 0x00..0x5f mapping characters 0x20..0x7f.
pub const FONT: [[u8; 5]; 96] = [
    [0x0, 0x0, 0x0, 0x0, 0x0], // space
    [0x4, 0x4, 0x4, 0x0, 0x4], // !
    [0xa, 0xa, 0x0, 0x0, 0x0], // "
    [0xa, 0xe, 0xa, 0xe, 0xa], // #
    [0x6, 0xc, 0x4, 0x6, 0xc], // $
    [0xa, 0x2, 0x4, 0x8, 0xa], // %
    [0x6, 0xa, 0x4, 0xa, 0x6], // &
    [0x4, 0x4, 0x0, 0x0, 0x0], // '
    [0x2, 0x4, 0x4, 0x4, 0x2], // (
    [0x8, 0x4, 0x4, 0x4, 0x8], // )
    [0xa, 0x4, 0xe, 0x4, 0xa], // *
    [0x0, 0x4, 0xe, 0x4, 0x0], // +
    [0x0, 0x0, 0x0, 0x4, 0x8], // ,
    [0x0, 0x0, 0xe, 0x0, 0x0], // -
    [0x0, 0x0, 0x0, 0x0, 0x4], // .
    [0x2, 0x2, 0x4, 0x8, 0x8], // /
    [0xe, 0xa, 0xa, 0xa, 0xe], // 0
    [0x4, 0xc, 0x4, 0x4, 0xe], // 1
    [0xe, 0x2, 0xe, 0x8, 0xe], // 2
    [0xe, 0x2, 0x6, 0x2, 0xe], // 3
    [0xa, 0xa, 0xe, 0x2, 0x2], // 4
    [0xe, 0x8, 0xe, 0x2, 0xe], // 5
    [0xe, 0x8, 0xe, 0xa, 0xe], // 6
    [0xe, 0x2, 0x2, 0x2, 0x2], // 7
    [0xe, 0xa, 0xe, 0xa, 0xe], // 8
    [0xe, 0xa, 0xe, 0x2, 0xe], // 9
    [0x0, 0x4, 0x0, 0x4, 0x0], // :
    [0x0, 0x4, 0x0, 0x4, 0x8], // ;
    [0x2, 0x4, 0x8, 0x4, 0x2], // <
    [0x0, 0xe, 0x0, 0xe, 0x0], // =
    [0x8, 0x4, 0x2, 0x4, 0x8], // >
    [0xe, 0x2, 0x6, 0x0, 0x4], // ?
    [0x4, 0xa, 0xe, 0x8, 0x6], // @
    [0xe, 0xa, 0xe, 0xa, 0xa], // A
    [0xc, 0xa, 0xc, 0xa, 0xc], // B
    [0x6, 0x8, 0x8, 0x8, 0x6], // C
    [0xc, 0xa, 0xa, 0xa, 0xc], // D
    [0xe, 0x8, 0xe, 0x8, 0xe], // E
    [0xe, 0x8, 0xe, 0x8, 0x8], // F
    [0x6, 0x8, 0xa, 0xa, 0x6], // G
    [0xa, 0xa, 0xe, 0xa, 0xa], // H
    [0xe, 0x4, 0x4, 0x4, 0xe], // I
    [0x2, 0x2, 0x2, 0xa, 0x4], // J
    [0xa, 0xa, 0xc, 0xa, 0xa], // K
    [0x8, 0x8, 0x8, 0x8, 0xe], // L
    [0xa, 0xe, 0xe, 0xa, 0xa], // M
    [0xc, 0xa, 0xa, 0xa, 0xa], // N
    [0x4, 0xa, 0xa, 0xa, 0x4], // O
    [0xe, 0xa, 0xe, 0x8, 0x8], // P
    [0x4, 0xa, 0xa, 0xc, 0x6], // Q
    [0xc, 0xa, 0xc, 0xa, 0xa], // R
    [0x6, 0x8, 0x4, 0x2, 0xc], // S
    [0xe, 0x4, 0x4, 0x4, 0x4], // T
    [0xa, 0xa, 0xa, 0xa, 0x6], // U
    [0xa, 0xa, 0xa, 0xa, 0x4], // V
    [0xa, 0xa, 0xe, 0xe, 0xa], // W
    [0xa, 0xa, 0x4, 0xa, 0xa], // X
    [0xa, 0xa, 0x4, 0x4, 0x4], // Y
    [0xe, 0x2, 0x4, 0x8, 0xe], // Z
    [0x6, 0x4, 0x4, 0x4, 0x6], // [
    [0x8, 0x8, 0x4, 0x2, 0x2], // backslash
    [0x6, 0x2, 0x2, 0x2, 0x6], // ]
    [0x4, 0xa, 0x0, 0x0, 0x0], // ^
    [0x0, 0x0, 0x0, 0x0, 0xe], // _
    [0x4, 0x2, 0x0, 0x0, 0x0], // `
    [0xe, 0xa, 0xe, 0xa, 0xa], // a
    [0xc, 0xa, 0xc, 0xa, 0xc], // b
    [0x6, 0x8, 0x8, 0x8, 0x6], // c
    [0xc, 0xa, 0xa, 0xa, 0xc], // d
    [0xe, 0x8, 0xe, 0x8, 0xe], // e
    [0xe, 0x8, 0xe, 0x8, 0x8], // f
    [0x6, 0x8, 0xa, 0xa, 0x6], // g
    [0xa, 0xa, 0xe, 0xa, 0xa], // h
    [0xe, 0x4, 0x4, 0x4, 0xe], // i
    [0x2, 0x2, 0x2, 0xa, 0x4], // j
    [0xa, 0xa, 0xc, 0xa, 0xa], // k
    [0x8, 0x8, 0x8, 0x8, 0xe], // l
    [0xa, 0xe, 0xe, 0xa, 0xa], // m
    [0xc, 0xa, 0xa, 0xa, 0xa], // n
    [0x4, 0xa, 0xa, 0xa, 0x4], // o
    [0xe, 0xa, 0xe, 0x8, 0x8], // p
    [0x4, 0xa, 0xa, 0xc, 0x6], // q
    [0xc, 0xa, 0xc, 0xa, 0xa], // r
    [0x6, 0x8, 0x4, 0x2, 0xc], // s
    [0xe, 0x4, 0x4, 0x4, 0x4], // t
    [0xa, 0xa, 0xa, 0xa, 0x6], // u
    [0xa, 0xa, 0xa, 0xa, 0x4], // v
    [0xa, 0xa, 0xe, 0xe, 0xa], // w
    [0xa, 0xa, 0x4, 0xa, 0xa], // x
    [0xa, 0xa, 0x4, 0x4, 0x4], // y
    [0xe, 0x2, 0x4, 0x8, 0xe], // z
    [0x6, 0x4, 0xc, 0x4, 0x6], // {
    [0x4, 0x4, 0x4, 0x4, 0x4], // |
    [0xc, 0x4, 0x6, 0x4, 0xc], // }
    [0x0, 0x6, 0xc, 0x0, 0x0], // ~
    [0x4, 0xa, 0xa, 0xa, 0x4], // hollow circle
];

/// Wide glyphs, indices 0x00..0x1f mapping characters 0x80..0x9f.
pub const FONT_WIDE: [[u8; 6]; 32] = [
    [0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0x00], // solid block
    [0xaa, 0x54, 0xaa, 0x54, 0xaa, 0x00], // medium shade
    [0x6c, 0xfe, 0xba, 0xfe, 0x7c, 0x00], // cat
    [0x38, 0x38, 0xfe, 0x7c, 0x38, 0x00], // down arrow
    [0x88, 0x22, 0x88, 0x22, 0x88, 0x00], // light shade
    [0x92, 0x54, 0x38, 0x54, 0x92, 0x00], // flower
    [0x38, 0x7c, 0x7c, 0x7c, 0x38, 0x00], // filled circle
    [0x6c, 0xfe, 0xfe, 0x7c, 0x38, 0x00], // heart
    [0x7c, 0x82, 0x92, 0x82, 0x7c, 0x00], // circled dot
    [0x38, 0x38, 0xfe, 0x38, 0x6c, 0x00], // figure
    [0x10, 0x38, 0x7c, 0xfe, 0x6c, 0x00], // house
    [0x20, 0x60, 0xfe, 0x60, 0x20, 0x00], // left arrow
    [0x7c, 0xaa, 0x82, 0xba, 0x7c, 0x00], // face
    [0x1c, 0x14, 0x10, 0x70, 0x70, 0x00], // note
    [0x7c, 0xfe, 0xc6, 0xfe, 0x7c, 0x00], // o button
    [0x10, 0x38, 0x7c, 0x38, 0x10, 0x00], // diamond
    [0x00, 0x00, 0x00, 0x00, 0x92, 0x00], // ellipsis
    [0x08, 0x0c, 0xfe, 0x0c, 0x08, 0x00], // right arrow
    [0x10, 0x54, 0x7c, 0x38, 0x6c, 0x00], // star
    [0xfe, 0x7c, 0x38, 0x7c, 0xfe, 0x00], // hourglass
    [0x38, 0x7c, 0xfe, 0x38, 0x38, 0x00], // up arrow
    [0x44, 0x28, 0x10, 0x00, 0x00, 0x00], // caron
    [0x10, 0x28, 0x44, 0x82, 0x00, 0x00], // wedge
    [0xfe, 0xba, 0xd6, 0xba, 0xfe, 0x00], // x button
    [0xfe, 0x82, 0xfe, 0x82, 0xfe, 0x00], // lined square
    [0xfe, 0xaa, 0xaa, 0xaa, 0xfe, 0x00], // barred square
    [0x0e, 0x38, 0xe0, 0x38, 0x0e, 0x00], // logo 0
    [0xe0, 0x38, 0x0e, 0x38, 0xe0, 0x00], // logo 1
    [0x92, 0x92, 0x92, 0x92, 0x92, 0x00], // logo 2
    [0xfe, 0x00, 0xfe, 0x00, 0xfe, 0x00], // logo 3
    [0xc6, 0x6c, 0x38, 0x6c, 0xc6, 0x00], // logo 4
    [0x38, 0x44, 0x92, 0x44, 0x38, 0x00], // logo 5
];
