//! Footprint shape model.
//!
//! A footprint is an ordered sequence of geometric primitives: through-hole
//! pads, surface-mount pads, and silkscreen lines/arcs. Scripts produce a
//! [`RawFootprint`]; the [`normalize`] pass turns it into a
//! [`NormalizedFootprint`] with defaulted kinds and sequential pad names.
//!
//! Shapes serialize to JSON via serde; that JSON is the hand-off format for
//! external renderers.

pub mod normalize;

pub use normalize::normalize;

use serde::{Deserialize, Serialize};

/// The kind of a footprint primitive.
///
/// The set is closed per release: export backends match exhaustively on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    /// Through-hole pad.
    Pad,
    /// Surface-mount pad.
    Smd,
    /// Silkscreen line segment.
    SilkLine,
    /// Silkscreen arc.
    SilkArc,
}

impl PrimitiveKind {
    /// Default kind assigned to shapes declared without one.
    pub const DEFAULT_SILK: Self = Self::SilkLine;

    /// Whether primitives of this kind are electrically significant and
    /// therefore receive a sequential name during normalization.
    #[must_use]
    pub const fn is_electrical(self) -> bool {
        matches!(self, Self::Pad | Self::Smd)
    }
}

/// Default silkscreen line width in mm.
pub const DEFAULT_SILK_WIDTH: f64 = 0.15;

/// Kind-specific geometry of a primitive.
///
/// All coordinates and sizes are in mm, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "geometry", rename_all = "snake_case")]
pub enum Geometry {
    /// Through-hole pad: circular copper annulus with a drill hole.
    Pad {
        /// X position from footprint origin.
        x: f64,
        /// Y position from footprint origin.
        y: f64,
        /// Outer copper diameter.
        diameter: f64,
        /// Drill hole diameter.
        drill: f64,
        /// Rotation angle in degrees.
        #[serde(default)]
        rotation: f64,
    },

    /// Surface-mount pad: rectangular copper area.
    Smd {
        /// X position of the pad centre.
        x: f64,
        /// Y position of the pad centre.
        y: f64,
        /// Pad width.
        dx: f64,
        /// Pad height.
        dy: f64,
        /// Rotation angle in degrees.
        #[serde(default)]
        rotation: f64,
    },

    /// Line segment.
    Line {
        /// Start X.
        x1: f64,
        /// Start Y.
        y1: f64,
        /// End X.
        x2: f64,
        /// End Y.
        y2: f64,
        /// Stroke width.
        width: f64,
    },

    /// Circular arc described by centre, radius and angle sweep.
    Arc {
        /// Centre X.
        x: f64,
        /// Centre Y.
        y: f64,
        /// Arc radius.
        radius: f64,
        /// Start angle in degrees (counter-clockwise from positive X).
        start_angle: f64,
        /// End angle in degrees.
        end_angle: f64,
        /// Stroke width.
        width: f64,
    },
}

/// One declared footprint primitive.
///
/// `kind` is `None` when the script declared a shape without a kind; the
/// normalizer retags those as [`PrimitiveKind::DEFAULT_SILK`]. `name` is
/// assigned by the normalizer and only ever present on electrical primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    /// Primitive kind, absent until defaulted by normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<PrimitiveKind>,

    /// Pad designator, assigned by normalization for Pad/Smd primitives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Kind-specific geometry.
    #[serde(flatten)]
    pub geometry: Geometry,
}

impl ShapeDescriptor {
    /// Creates an unnamed descriptor with an explicit kind.
    #[must_use]
    pub const fn new(kind: PrimitiveKind, geometry: Geometry) -> Self {
        Self {
            kind: Some(kind),
            name: None,
            geometry,
        }
    }

    /// Creates a descriptor whose kind is left for normalization to default.
    #[must_use]
    pub const fn untagged(geometry: Geometry) -> Self {
        Self {
            kind: None,
            name: None,
            geometry,
        }
    }
}

/// The raw shape sequence produced by script evaluation.
///
/// Order is significant: it is the script's declaration order and is
/// preserved through normalization and export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFootprint {
    /// Declared shapes in declaration order.
    pub shapes: Vec<ShapeDescriptor>,
}

impl RawFootprint {
    /// Creates an empty raw footprint.
    #[must_use]
    pub const fn new() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Appends a shape, preserving declaration order.
    pub fn push(&mut self, shape: ShapeDescriptor) {
        self.shapes.push(shape);
    }

    /// Number of declared shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns true if no shapes were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// A footprint after the normalization pass.
///
/// Invariants:
/// - every element has a kind (absent kinds defaulted to silk),
/// - every Pad/Smd element has a unique name, assigned as consecutive
///   integers starting at `"1"` in declaration order,
/// - every other element has no name,
/// - ordering is identical to the raw input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFootprint {
    /// Normalized shapes in original declaration order.
    pub shapes: Vec<ShapeDescriptor>,
}

impl NormalizedFootprint {
    /// Number of shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns true if the footprint has no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Iterates over the shapes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ShapeDescriptor> {
        self.shapes.iter()
    }
}
