use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://overleaf.writefull.ai";
pub const DEFAULT_PAGE_PATH: &str = "/palette.html";
pub const DEFAULT_OUTPUT: &str = "data/palette.json";

/// Where to scrape from and where the artifact goes.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub page_path: String,
    pub output: PathBuf,
}

impl Settings {
    /// Defaults, then `PALETTE_*` environment variables.
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("page_path", DEFAULT_PAGE_PATH)?
            .set_default("output", DEFAULT_OUTPUT)?
            .add_source(Environment::with_prefix("PALETTE"))
            .build()
            .context("Failed to read PALETTE_* settings")?
            .try_deserialize()
            .context("Invalid PALETTE_* settings")
    }

    /// Command-line flags win over everything else.
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        page_path: Option<String>,
        output: Option<PathBuf>,
    ) -> Self {
        if let Some(b) = base_url {
            self.base_url = b;
        }
        if let Some(p) = page_path {
            self.page_path = p;
        }
        if let Some(o) = output {
            self.output = o;
        }
        self
    }
}
