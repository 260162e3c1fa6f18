//! Footprint normalization.
//!
//! The normalizer is the only pass between script evaluation and export. It
//! walks the raw shape sequence once, in declaration order, and:
//!
//! - retags shapes declared without a kind as the default silk kind,
//! - assigns sequential names (`"1"`, `"2"`, ...) to electrical primitives
//!   (pads and surface-mount pads) in declaration order.
//!
//! The counter is local to each call, so repeated and concurrent compiles
//! never share numbering state.

use super::{NormalizedFootprint, PrimitiveKind, RawFootprint};

/// Normalizes a raw footprint.
///
/// Pure and total: it cannot fail, and the output ordering is identical to
/// the input ordering. Re-running it on a normalized footprint's shapes
/// renumbers from 1 again, yielding the same names when the order is
/// unchanged.
#[must_use]
pub fn normalize(raw: RawFootprint) -> NormalizedFootprint {
    let mut counter = 1u32;
    let shapes = raw
        .shapes
        .into_iter()
        .map(|mut shape| {
            let kind = shape.kind.unwrap_or(PrimitiveKind::DEFAULT_SILK);
            shape.kind = Some(kind);
            shape.name = if kind.is_electrical() {
                let name = counter.to_string();
                counter += 1;
                Some(name)
            } else {
                None
            };
            shape
        })
        .collect();

    NormalizedFootprint { shapes }
}
