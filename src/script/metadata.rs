//! Footprint identity metadata: extraction, rewriting and templating.
//!
//! A footprint script declares its identity in directive comments, normally
//! at the top of the file:
//!
//! ```text
//! // @id sot23
//! // @name SOT-23
//! // @desc Small outline transistor, 3 leads
//! ```
//!
//! Extraction is a regex scan over the source text, fully independent of
//! evaluation: it succeeds even when the script's geometry logic would fail
//! at runtime. The rewrite engine substitutes only the located `@id` and
//! `@name` value spans, so cloning a footprint preserves its geometry (and
//! every other byte) exactly.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File extension of footprint scripts (`<id>.fps` under a library directory).
pub const SCRIPT_EXTENSION: &str = "fps";

/// Footprint identity, read from directive comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintMetadata {
    /// Filesystem-safe token used as the script's file stem.
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// Free-form description; empty when the `@desc` directive is absent.
    #[serde(default)]
    pub description: String,
}

/// Errors produced by metadata extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// No identity declaration was found in the source.
    #[error("no identity declaration found (expected an `// @id <id>` directive)")]
    Missing,

    /// An identity declaration was found but could not be parsed.
    #[error("malformed identity declaration: {reason}")]
    Malformed {
        /// What was wrong with the declaration.
        reason: String,
    },
}

impl MetadataError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^//[ \t]*@id[ \t]+(\S+)[ \t]*$").expect("valid regex"))
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^//[ \t]*@name[ \t]+(.+?)[ \t]*$").expect("valid regex"))
}

fn desc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^//[ \t]*@desc[ \t]+(.+?)[ \t]*$").expect("valid regex"))
}

/// Whether `id` is safe to use as a file stem.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    let mut chars = id.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Whether `name` can be carried by a single-line `@name` directive.
///
/// The directive grammar trims surrounding whitespace and ends at the line
/// break, so names must be non-empty, single-line and free of surrounding
/// whitespace to survive an extract/rewrite round trip.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name == name.trim() && !name.contains(['\n', '\r'])
}

/// Extracts footprint identity from source text.
///
/// # Errors
///
/// Returns [`MetadataError::Missing`] when no `@id` directive exists, and
/// [`MetadataError::Malformed`] when directives are present but the id is not
/// a filesystem-safe token or the `@name` directive is absent.
pub fn extract_metadata(source: &str) -> Result<FootprintMetadata, MetadataError> {
    let id = id_regex()
        .captures(source)
        .ok_or(MetadataError::Missing)?
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    if !is_valid_id(&id) {
        return Err(MetadataError::malformed(format!(
            "id `{id}` is not a filesystem-safe token"
        )));
    }

    let name = name_regex()
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| MetadataError::malformed("missing `@name` directive"))?;

    let description = desc_regex()
        .captures(source)
        .and_then(|c| c.get(1))
        .map_or_else(String::new, |m| m.as_str().to_string());

    Ok(FootprintMetadata {
        id,
        name,
        description,
    })
}

/// Rewrites the identity of existing source text.
///
/// Replaces only the value spans of the `@id` and `@name` directives located
/// by [`extract_metadata`]; all other source text, including whitespace and
/// comments, is preserved byte for byte. `old` is the metadata previously
/// extracted from `source`; passing it keeps the call site honest about
/// having resolved the identity first.
///
/// `new_id` and `new_name` are substituted verbatim and must satisfy
/// [`is_valid_id`] and [`is_valid_name`] for the result to re-extract to the
/// same values; the library operations enforce this.
#[must_use]
pub fn rewrite_identity(
    source: &str,
    old: &FootprintMetadata,
    new_id: &str,
    new_name: &str,
) -> String {
    let mut spans: Vec<(std::ops::Range<usize>, &str)> = Vec::with_capacity(2);

    if let Some(m) = id_regex().captures(source).and_then(|c| c.get(1)) {
        debug_assert_eq!(m.as_str(), old.id);
        spans.push((m.range(), new_id));
    }
    if let Some(m) = name_regex().captures(source).and_then(|c| c.get(1)) {
        debug_assert_eq!(m.as_str(), old.name);
        spans.push((m.range(), new_name));
    }

    // Substitute back to front so earlier ranges stay valid.
    spans.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
    let mut out = source.to_string();
    for (range, replacement) in spans {
        out.replace_range(range, replacement);
    }
    out
}

/// Minimal source for a newly created footprint.
///
/// `id` and `name` land on directive lines verbatim; callers validate them
/// with [`is_valid_id`] and [`is_valid_name`] first.
#[must_use]
pub fn template(id: &str, name: &str) -> String {
    format!(
        "// @id {id}\n\
         // @name {name}\n\
         // @desc \n\
         \n\
         smd({{x: -0.5, y: 0, dx: 0.6, dy: 0.5}});\n\
         smd({{x: 0.5, y: 0, dx: 0.6, dy: 0.5}});\n"
    )
}
