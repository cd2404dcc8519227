//! Mole Grid core crate.
//!
//! A whack-a-mole minigame: a 3x3 grid, a mole that hops to a random cell every
//! few hundred milliseconds, and a 30 second countdown. The game logic lives in
//! `game` and runs natively (see `game::clock::VirtualClock`); `dom` binds it to
//! the page when compiled to wasm.

use wasm_bindgen::prelude::*;

pub mod dom;
pub mod game;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    console_log::init_with_level(log::Level::Debug).ok();
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

/// Mount the game onto the page. The round begins when the start button is
/// clicked (or `request_start` is called).
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    dom::mount()
}

/// Like `start_game`, with a JSON `GameConfig`; missing fields keep defaults.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_game_with_config(json: &str) -> Result<(), JsValue> {
    let config =
        game::GameConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    dom::mount_with(config)
}

#[wasm_bindgen]
pub fn request_start() {
    dom::dispatch(game::GameEvent::StartRequested);
}

#[wasm_bindgen]
pub fn current_score() -> u32 {
    dom::current_score()
}
