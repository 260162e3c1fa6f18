//! Eagle CAD XML library serialization.
//!
//! Emits an Eagle 6 `.lbr` document: one `<package>` per footprint inside
//! the fixed `<eagle><drawing><library><packages>` skeleton. Pads become
//! `<pad>`/`<smd>` elements carrying their assigned designator; silk shapes
//! become `<wire>` elements on the `tPlace` layer (layer 21), with arcs
//! expressed as curved wires and full revolutions as `<circle>` elements.
//!
//! All numbers go through [`fmt_num`], so serializing the same footprint
//! sequence twice is byte-for-byte identical.

use std::fmt::Write;

use crate::footprint::{Geometry, ShapeDescriptor};

use super::ExportEntry;

/// Eagle layer numbers used by the exporter.
const LAYER_TOP: u8 = 1;
const LAYER_SILK: u8 = 21;

/// Fixed layer table written into every document. Eagle refuses to load
/// elements on layers the document does not declare.
const LAYERS: &[(u8, &str, u8)] = &[
    (1, "Top", 4),
    (16, "Bottom", 1),
    (17, "Pads", 2),
    (18, "Vias", 2),
    (20, "Dimension", 15),
    (21, "tPlace", 7),
    (22, "bPlace", 7),
    (25, "tNames", 7),
    (26, "bNames", 7),
    (51, "tDocu", 14),
];

/// Serializes footprints into a complete Eagle library document.
pub(super) fn serialize(entries: &[ExportEntry]) -> String {
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<!DOCTYPE eagle SYSTEM \"eagle.dtd\">\n");
    out.push_str("<eagle version=\"6.4.0\">\n");
    out.push_str("<drawing>\n");
    out.push_str(
        "<grid distance=\"0.1\" unitdist=\"mm\" unit=\"mm\" style=\"lines\" multiple=\"1\" \
         display=\"no\" altdistance=\"0.01\" altunitdist=\"mm\" altunit=\"mm\"/>\n",
    );

    out.push_str("<layers>\n");
    for (number, name, color) in LAYERS {
        let _ = writeln!(
            out,
            "<layer number=\"{number}\" name=\"{name}\" color=\"{color}\" fill=\"1\" \
             visible=\"yes\" active=\"yes\"/>"
        );
    }
    out.push_str("</layers>\n");

    out.push_str("<library>\n");
    out.push_str("<packages>\n");
    for entry in entries {
        write_package(&mut out, entry);
    }
    out.push_str("</packages>\n");
    out.push_str("</library>\n");
    out.push_str("</drawing>\n");
    out.push_str("</eagle>\n");

    out
}

fn write_package(out: &mut String, entry: &ExportEntry) {
    let _ = writeln!(out, "<package name=\"{}\">", escape(&entry.metadata.id));
    if !entry.metadata.description.is_empty() {
        let _ = writeln!(
            out,
            "<description>{}</description>",
            escape(&entry.metadata.description)
        );
    }
    for shape in entry.footprint.iter() {
        write_shape(out, shape);
    }
    out.push_str("</package>\n");
}

fn write_shape(out: &mut String, shape: &ShapeDescriptor) {
    let designator = shape.name.as_deref().unwrap_or_default();
    match shape.geometry {
        Geometry::Pad {
            x,
            y,
            diameter,
            drill,
            rotation,
        } => {
            let _ = writeln!(
                out,
                "<pad name=\"{}\" x=\"{}\" y=\"{}\" drill=\"{}\" diameter=\"{}\"{}/>",
                escape(designator),
                fmt_num(x),
                fmt_num(y),
                fmt_num(drill),
                fmt_num(diameter),
                rot_attr(rotation),
            );
        }
        Geometry::Smd {
            x,
            y,
            dx,
            dy,
            rotation,
        } => {
            let _ = writeln!(
                out,
                "<smd name=\"{}\" x=\"{}\" y=\"{}\" dx=\"{}\" dy=\"{}\" layer=\"{LAYER_TOP}\"{}/>",
                escape(designator),
                fmt_num(x),
                fmt_num(y),
                fmt_num(dx),
                fmt_num(dy),
                rot_attr(rotation),
            );
        }
        Geometry::Line {
            x1,
            y1,
            x2,
            y2,
            width,
        } => {
            let _ = writeln!(
                out,
                "<wire x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" width=\"{}\" layer=\"{LAYER_SILK}\"/>",
                fmt_num(x1),
                fmt_num(y1),
                fmt_num(x2),
                fmt_num(y2),
                fmt_num(width),
            );
        }
        Geometry::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            width,
        } => {
            // Eagle expresses arcs as wires between the two endpoints with a
            // `curve` attribute giving the swept angle. A wire cannot carry a
            // full revolution (the endpoints coincide and the radius is lost),
            // so those become circle elements instead.
            let sweep = end_angle - start_angle;
            if sweep.abs() >= 360.0 {
                let _ = writeln!(
                    out,
                    "<circle x=\"{}\" y=\"{}\" radius=\"{}\" width=\"{}\" \
                     layer=\"{LAYER_SILK}\"/>",
                    fmt_num(x),
                    fmt_num(y),
                    fmt_num(radius),
                    fmt_num(width),
                );
            } else {
                let (sa, ea) = (start_angle.to_radians(), end_angle.to_radians());
                let (x1, y1) = (x + radius * sa.cos(), y + radius * sa.sin());
                let (x2, y2) = (x + radius * ea.cos(), y + radius * ea.sin());
                let _ = writeln!(
                    out,
                    "<wire x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" width=\"{}\" \
                     layer=\"{LAYER_SILK}\" curve=\"{}\"/>",
                    fmt_num(x1),
                    fmt_num(y1),
                    fmt_num(x2),
                    fmt_num(y2),
                    fmt_num(width),
                    fmt_num(sweep),
                );
            }
        }
    }
}

/// Rotation attribute, omitted for unrotated shapes.
fn rot_attr(rotation: f64) -> String {
    if rotation.abs() < 1e-9 {
        String::new()
    } else {
        format!(" rot=\"R{}\"", fmt_num(rotation))
    }
}

/// Deterministic number formatting: fixed precision, trailing zeros trimmed,
/// negative zero flushed to zero.
fn fmt_num(v: f64) -> String {
    let v = if v.abs() < 1e-9 { 0.0 } else { v };
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Minimal XML attribute/text escaping.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
