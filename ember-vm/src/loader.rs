//! Cartridge file loader: dispatches on extension and feeds the decoded
//! bytes to the core codec.

use std::fs;
use std::path::Path;

use ember_core::Cart;

use crate::VmError;

/// Load a cart from disk. `.png` files are image carts; anything else is
/// parsed as the text format.
pub fn load_cart(path: &Path) -> Result<Cart, VmError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => {
            let bytes = fs::read(path)?;
            let pixels = decode_png_rgba(&bytes)?;
            Ok(Cart::from_rgba(&pixels)?)
        }
        _ => {
            let source = fs::read_to_string(path)?;
            Ok(Cart::from_p8_text(&source))
        }
    }
}

/// Decode a PNG into tightly packed RGBA bytes. RGB images gain an opaque
/// alpha channel so the payload extraction sees four channels per pixel.
fn decode_png_rgba(bytes: &[u8]) -> Result<Vec<u8>, VmError> {
    let decoder = png::Decoder::new(bytes);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let buf = &buf[..info.buffer_size()];

    let channels = info.color_type.samples();
    if channels < 3 {
        return Err(VmError::CartLoad(format!(
            "expected an rgb or rgba image, got {:?}",
            info.color_type
        )));
    }

    let mut pixels = Vec::with_capacity(buf.len() / channels * 4);
    for px in buf.chunks_exact(channels) {
        pixels.extend_from_slice(&[
            px[0],
            px[1],
            px[2],
            if channels >= 4 { px[3] } else { 0xff },
        ]);
    }
    Ok(pixels)
}
