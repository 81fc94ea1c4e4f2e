use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::literal::Literal;
use crate::error::{ParseError, PipelineError, Result};

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s*(.+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: u64,
    pub title: String,
    pub raw_title: String,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category: String,
    pub topics: Vec<Topic>,
}

/// Categories → topics → example sentences, in artifact order.
pub type Palette = Vec<Category>;

/// An upstream intent before it is bound into a category.
#[derive(Debug, Clone, PartialEq)]
pub struct RawIntent {
    /// `None` when the label carries no `N. ` prefix.
    pub id: Option<u64>,
    pub title: String,
    pub raw_title: String,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    pub category: String,
    pub ids: Vec<u64>,
}

/// Split `"12. Some title"` into its numeric id and title.
pub fn parse_label(raw: &str) -> (Option<u64>, String) {
    LABEL_RE
        .captures(raw)
        .and_then(|caps| {
            let id = caps[1].parse::<u64>().ok()?;
            Some((Some(id), caps[2].to_string()))
        })
        .unwrap_or_else(|| (None, raw.to_string()))
}

/// Normalise the evaluated `{sections, intents}` literal into a sorted palette.
pub fn build(structure: &Literal) -> Result<Palette> {
    let intents = read_intents(field(structure, "intents")?)?;
    let sections = read_sections(field(structure, "sections")?)?;

    let mut by_id: HashMap<Option<u64>, RawIntent> = HashMap::with_capacity(intents.len());
    for intent in intents {
        if intent.id.is_none() {
            warn!(
                "Intent label {:?} has no numeric id; no section can reference it",
                intent.raw_title
            );
        }
        by_id.insert(intent.id, intent);
    }

    let mut palette = Vec::with_capacity(sections.len());
    for section in sections {
        let mut topics = Vec::with_capacity(section.ids.len());
        for id in section.ids {
            let intent = by_id.get(&Some(id)).ok_or_else(|| PipelineError::Integrity {
                category: section.category.clone(),
                id: id.to_string(),
            })?;
            topics.push(Topic {
                id,
                title: intent.title.clone(),
                raw_title: intent.raw_title.clone(),
                examples: intent.examples.clone(),
            });
        }
        topics.sort_by_key(|t| t.id);
        palette.push(Category {
            category: section.category,
            topics,
        });
    }

    palette.sort_by(|a, b| locale_compare(&a.category, &b.category));

    debug!(
        categories = palette.len(),
        intents = by_id.len(),
        "Built palette"
    );
    Ok(palette)
}

/// Approximates `String.prototype.localeCompare` for the default locale.
///
/// Base letters decide first (accents stripped, case folded), then accents
/// (unaccented first), then case (lowercase first), then the raw text.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let (base_a, base_b) = (strip_accents(a), strip_accents(b));
    base_a
        .to_lowercase()
        .cmp(&base_b.to_lowercase())
        .then_with(|| a.to_lowercase().nfd().cmp(b.to_lowercase().nfd()))
        .then_with(|| {
            base_a
                .chars()
                .zip(base_b.chars())
                .map(|(x, y)| case_rank(x).cmp(&case_rank(y)))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.cmp(b))
}

fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn case_rank(c: char) -> u8 {
    if c.is_uppercase() {
        1
    } else {
        0
    }
}

fn field<'a>(structure: &'a Literal, name: &str) -> Result<&'a [Literal]> {
    let value = structure.get(name).ok_or_else(|| {
        ParseError::shape(format!("palette literal has no `{}` field", name))
    })?;
    value.as_array().ok_or_else(|| {
        ParseError::shape(format!("`{}` is {}, expected an array", name, value.kind())).into()
    })
}

fn read_intents(entries: &[Literal]) -> Result<Vec<RawIntent>> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| -> Result<RawIntent> {
            let (label, examples) = entry.first_entry().ok_or_else(|| {
                ParseError::shape(format!("intents[{}] is not a non-empty object", i))
            })?;
            let examples = examples
                .as_array()
                .ok_or_else(|| {
                    ParseError::shape(format!("examples of intent {:?} are not an array", label))
                })?
                .iter()
                .map(|e| {
                    e.as_str().map(str::to_string).ok_or_else(|| {
                        ParseError::shape(format!(
                            "intent {:?} has a non-string example ({})",
                            label,
                            e.kind()
                        ))
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let (id, title) = parse_label(label);
            Ok(RawIntent {
                id,
                title,
                raw_title: label.to_string(),
                examples,
            })
        })
        .collect()
}

fn read_sections(entries: &[Literal]) -> Result<Vec<RawSection>> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| -> Result<RawSection> {
            let (category, ids) = entry.first_entry().ok_or_else(|| {
                ParseError::shape(format!("sections[{}] is not a non-empty object", i))
            })?;
            let ids = ids
                .as_array()
                .ok_or_else(|| {
                    ParseError::shape(format!("ids of section {:?} are not an array", category))
                })?
                .iter()
                .map(|v| section_id(category, v))
                .collect::<Result<Vec<_>>>()?;
            Ok(RawSection {
                category: category.to_string(),
                ids,
            })
        })
        .collect()
}

fn section_id(category: &str, value: &Literal) -> Result<u64> {
    let n = value.as_f64().ok_or_else(|| {
        ParseError::shape(format!(
            "section {:?} references a {} instead of an intent id",
            category,
            value.kind()
        ))
    })?;
    // Labels only ever yield whole non-negative ids, so nothing else can resolve.
    if n.fract() != 0.0 || n < 0.0 || n >= u64::MAX as f64 {
        return Err(PipelineError::Integrity {
            category: category.to_string(),
            id: n.to_string(),
        });
    }
    Ok(n as u64)
}
