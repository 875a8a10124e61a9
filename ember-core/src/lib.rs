#![no_std]
extern crate alloc;

pub mod cart;
pub mod charset;
pub mod console;
pub mod fix32;
pub mod fixup;
pub mod font;
pub mod gfx;
pub mod input;
pub mod memory;
pub mod synth;

use alloc::string::String;
use thiserror::Error;

pub use cart::Cart;
pub use charset::Charset;
pub use console::Console;
pub use fix32::Fix32;
pub use memory::Memory;

pub type Result<T> = core::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A write landed outside `[0, MEM_SIZE)`. Script-fatal.
    #[error("bad memory access")]
    BadMemoryAccess(i32),
    #[error("bad cartridge: {0}")]
    BadCart(String),
}
