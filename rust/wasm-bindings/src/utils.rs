// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Set panic hook for better error messages in the browser
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Log a formatted debug line to the browser console
macro_rules! console_debug {
    ($($arg:tt)*) => {
        web_sys::console::debug_1(&format!("[COLLAGE] {}", format!($($arg)*)).into())
    };
}

/// Log a formatted warning to the browser console
macro_rules! console_warn {
    ($($arg:tt)*) => {
        web_sys::console::warn_1(&format!("[COLLAGE] {}", format!($($arg)*)).into())
    };
}

pub(crate) use console_debug;
pub(crate) use console_warn;
