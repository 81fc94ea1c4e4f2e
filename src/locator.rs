use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{PipelineError, Result};

/// `<script ... src="…legacy/….js[?…]">`, single or double quoted.
static LEGACY_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<script\b[^>]*?\bsrc\s*=\s*(?:"((?:[^"]*/)?legacy/[^"]*\.js(?:[?#][^"]*)?)"|'((?:[^']*/)?legacy/[^']*\.js(?:[?#][^']*)?)')"#,
    )
    .unwrap()
});

/// Find the first legacy bundle reference in the page, returned verbatim.
pub fn locate_script_reference(html: &str) -> Result<String> {
    LEGACY_SCRIPT_RE
        .captures_iter(html)
        .find_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| PipelineError::NotFound("script reference missing".into()))
}

/// Resolve a (possibly relative) script reference against the site root.
pub fn resolve_reference(base_url: &str, reference: &str) -> Result<Url> {
    let base = parse_url(base_url)?;
    base.join(reference).map_err(|e| PipelineError::InvalidUrl {
        url: reference.to_string(),
        reason: e.to_string(),
    })
}

pub fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| PipelineError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
