use std::path::Path;

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::parser::palette::Palette;

/// Pretty JSON (2-space indent) with a trailing newline, the format the UI imports.
pub fn render(palette: &Palette) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(palette)?;
    out.push('\n');
    Ok(out)
}

/// Write the artifact in one call, replacing whatever is there.
/// The parent directory must already exist.
pub async fn persist(palette: &Palette, dest: &Path) -> Result<()> {
    let body = render(palette).map_err(|source| PipelineError::Artifact {
        path: dest.to_path_buf(),
        source,
    })?;
    tokio::fs::write(dest, body.as_bytes())
        .await
        .map_err(|source| PipelineError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
    info!("Wrote {} bytes to {}", body.len(), dest.display());
    Ok(())
}

/// Read a previously written artifact back.
pub async fn load(src: &Path) -> Result<Palette> {
    let text = tokio::fs::read_to_string(src)
        .await
        .map_err(|source| PipelineError::Io {
            path: src.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| PipelineError::Artifact {
        path: src.to_path_buf(),
        source,
    })
}

/// Totals over a palette: (categories, topics, examples).
pub fn totals(palette: &Palette) -> (usize, usize, usize) {
    palette.iter().fold((0, 0, 0), |(c, t, e), category| {
        (
            c + 1,
            t + category.topics.len(),
            e + category.topics.iter().map(|t| t.examples.len()).sum::<usize>(),
        )
    })
}
