//! Footprint script handling.
//!
//! Three independent operations over script source text:
//!
//! - [`evaluator::evaluate`] — run the script in a sandbox and collect the
//!   declared shape sequence,
//! - [`metadata::extract_metadata`] — read the identity directives without
//!   evaluating anything,
//! - [`metadata::rewrite_identity`] — substitute a new identity while
//!   preserving the rest of the source byte for byte.

pub mod error;
pub mod evaluator;
pub mod metadata;

pub use error::{RuntimeErrorKind, ScriptError, ScriptResult};
pub use evaluator::evaluate;
pub use metadata::{
    extract_metadata, is_valid_id, is_valid_name, rewrite_identity, template, FootprintMetadata,
    MetadataError, SCRIPT_EXTENSION,
};
