// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collage WebAssembly Bindings
//!
//! JavaScript/TypeScript API for building meshes, ground overlays and color
//! ramps, built with wasm-bindgen. Buffers are handed to the renderer either as
//! typed-array copies or as pointers into WASM memory (see [`get_memory`]).

use wasm_bindgen::prelude::*;

#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

mod api;
mod utils;
mod zero_copy;

pub use api::{BuildingMeshApi, GroundOverlayApi};
pub use utils::set_panic_hook as init_panic_hook;
pub use zero_copy::get_memory;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the version of Collage
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
