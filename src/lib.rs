//! fpscript: a compiler for scripted PCB footprints.
//!
//! Footprints are authored in a small sandboxed scripting language; this
//! crate evaluates a script into a normalized list of geometric shapes and
//! serializes footprints into an Eagle CAD library file.
//!
//! # Pipeline
//!
//! ```text
//! source text -> evaluate -> RawFootprint -> normalize -> NormalizedFootprint
//!                                                              |
//!                                   external renderer (JSON) / export (Eagle .lbr)
//! ```
//!
//! Metadata extraction and identity rewriting operate directly on source
//! text, independent of evaluation, and back the library `new`/`clone`
//! operations.
//!
//! # Modules
//!
//! - [`footprint`] — shape model and normalization
//! - [`script`] — sandboxed evaluation, metadata extraction, identity rewriting
//! - [`export`] — Eagle library serialization
//! - [`library`] — footprint library directory operations
//! - [`config`] — configuration loading and validation
//! - [`error`] — configuration error types

pub mod config;
pub mod error;
pub mod export;
pub mod footprint;
pub mod library;
pub mod script;

use footprint::{normalize, NormalizedFootprint};
use script::{evaluate, ScriptResult};

/// Compiles script source into a normalized footprint.
///
/// Equivalent to `normalize(evaluate(source)?)`; the one-call front door for
/// callers that do not need the raw shape sequence.
///
/// # Errors
///
/// Returns a [`script::ScriptError`] when evaluation fails; normalization
/// itself cannot fail.
pub fn compile(source: &str) -> ScriptResult<NormalizedFootprint> {
    Ok(normalize(evaluate(source)?))
}
