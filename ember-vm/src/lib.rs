//! Scripted-program host for the ember fantasy console.
//!
//! [`Vm`] owns a Lua 5.4 state with the console API registered as native
//! callbacks, an instruction-count hook that yields the running cart back
//! to the host once per frame budget, and the cartridge loader. The
//! embedder drives it with [`Vm::load`], [`Vm::run`] and [`Vm::step`], and
//! feeds input through [`Vm::button`] and [`Vm::mouse`].

mod api;
mod loader;

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use mlua::{HookTriggers, Lua, VmState};
use thiserror::Error;

use ember_core::memory::SIZE_SCREEN;
use ember_core::{Console, Fix32};

pub use loader::load_cart;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("png error: {0}")]
    Png(#[from] png::DecodingError),
    #[error("script error: {0}")]
    Script(#[from] mlua::Error),
    #[error(transparent)]
    Core(#[from] ember_core::CoreError),
    #[error("cart load failed: {0}")]
    CartLoad(String),
}

/// Scheduler knobs. The hook fires every `hook_period` instructions; once
/// the accumulated count reaches `instruction_budget` the running cart
/// yields until the next `step`. The default budget matches what existing
/// carts were tuned against.
#[derive(Clone, Copy, Debug)]
pub struct VmConfig {
    pub hook_period: u32,
    pub instruction_budget: u32,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            hook_period: 1_000,
            instruction_budget: 300_000,
        }
    }
}

pub struct Vm {
    lua: Lua,
    instructions: Arc<AtomicU32>,
}

impl Vm {
    pub fn new() -> Result<Vm, VmError> {
        Vm::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Result<Vm, VmError> {
        let lua = Lua::new();
        let instructions = Arc::new(AtomicU32::new(0));

        {
            let counter = Arc::clone(&instructions);
            let period = config.hook_period.max(1);
            let budget = config.instruction_budget;
            lua.set_hook(
                HookTriggers::new().every_nth_instruction(period),
                move |_lua, _debug| {
                    let count = counter.fetch_add(period, Ordering::Relaxed) + period;
                    if count >= budget {
                        Ok(VmState::Yield)
                    } else {
                        Ok(VmState::Continue)
                    }
                },
            );
        }

        lua.set_app_data(Console::new());
        lua.set_app_data(api::Clock::new());
        api::register_all(&lua)?;
        lua.load(include_str!("bios.lua")).set_name("bios").exec()?;

        Ok(Vm { lua, instructions })
    }

    /// Load a cartridge from disk. On failure the previous cart, if any,
    /// stays active and unmodified.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), VmError> {
        let cart = loader::load_cart(path.as_ref())?;
        self.console_mut()?.cart = Some(cart);
        Ok(())
    }

    /// Start the loaded cart: clears the button state, loads the cart code
    /// as a chunk and hands it to the frame loop.
    pub fn run(&mut self) -> Result<(), VmError> {
        let run: mlua::Function = self.lua.globals().get("run")?;
        run.call::<()>(())?;
        Ok(())
    }

    /// Advance one frame: resumes the cart coroutine until it finishes the
    /// frame or exhausts the instruction budget, then resets the budget.
    pub fn step(&mut self, _dt: f32) -> Result<(), VmError> {
        let ember: mlua::Table = self.lua.globals().get("_ember")?;
        let tick: mlua::Function = ember.get("tick")?;
        let result = tick.call::<()>(());
        self.instructions.store(0, Ordering::Relaxed);
        result.map_err(VmError::from)
    }

    /// Embedder-side raw button state; indices 0..63, player-interleaved
    /// as `button + 8 * player`.
    pub fn button(&mut self, index: usize, state: bool) -> Result<(), VmError> {
        self.console_mut()?.buttons.set(index, state);
        Ok(())
    }

    pub fn mouse(&mut self, x: i32, y: i32, buttons: u8) -> Result<(), VmError> {
        let mut con = self.console_mut()?;
        con.mouse_x = Fix32::from_i32(x);
        con.mouse_y = Fix32::from_i32(y);
        con.mouse_buttons = Fix32::from_i32(buttons as i32);
        Ok(())
    }

    /// Copy the raw 4-bit packed framebuffer (0x2000 bytes).
    pub fn screen(&self, out: &mut [u8; SIZE_SCREEN]) -> Result<(), VmError> {
        let con = self.console()?;
        out.copy_from_slice(con.mem.screen());
        Ok(())
    }

    /// Convert the framebuffer to RGBA through the screen palette;
    /// `out` must hold 128*128*4 bytes.
    pub fn screen_rgba(&self, out: &mut [u8]) -> Result<(), VmError> {
        self.console()?.screen_rgba(out);
        Ok(())
    }

    /// Read-only view of the whole machine state.
    pub fn console(&self) -> Result<mlua::AppDataRef<'_, Console>, VmError> {
        self.lua
            .app_data_ref::<Console>()
            .ok_or_else(|| VmError::CartLoad("console state missing".into()))
    }

    pub fn console_mut(&self) -> Result<mlua::AppDataRefMut<'_, Console>, VmError> {
        self.lua
            .app_data_mut::<Console>()
            .ok_or_else(|| VmError::CartLoad("console state missing".into()))
    }

    /// The underlying Lua state, for embedders extending the API surface.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }
}
