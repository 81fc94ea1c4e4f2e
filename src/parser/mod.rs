pub mod literal;
pub mod palette;
pub mod snippet;

use crate::error::Result;
use palette::Palette;

/// Three-step pipeline: script source → snippet → literal → palette.
pub fn extract_palette(script_source: &str) -> Result<Palette> {
    let snippet = snippet::extract_snippet(script_source)?;
    let structure = literal::evaluate(snippet)?;
    palette::build(&structure)
}

// ── Tests ──
