// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The bundled monospaced font. The rasteriser draws with it and the PDF text
// layer embeds it, so printed and extractable text use the same glyphs.

use ab_glyph::FontRef;
use docforge_core::error::{DocforgeError, Result};

/// DejaVu Sans Mono, TrueType outlines.
pub static FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSansMono.ttf");

/// PostScript name of [`FONT_DATA`].
pub const FONT_NAME: &str = "DejaVuSansMono";

pub fn bundled_font() -> Result<FontRef<'static>> {
    FontRef::try_from_slice(FONT_DATA)
        .map_err(|err| DocforgeError::ImageError(format!("bundled font is invalid: {err}")))
}
