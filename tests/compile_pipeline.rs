//! End-to-end tests of the compile pipeline: script source through
//! evaluation and normalization.

use fpscript::footprint::{Geometry, PrimitiveKind};
use fpscript::script::{extract_metadata, RuntimeErrorKind, ScriptError};

const SOT23: &str = r#"
// @id sot23
// @name SOT-23
// @desc Small outline transistor, 3 leads

const pitch = 0.95;
for (let i = 0; i < 2; i++) {
    smd({x: (i * 2 - 1) * pitch, y: -1.1, dx: 0.6, dy: 0.7});
}
smd({x: 0, y: 1.1, dx: 0.6, dy: 0.7});
silk_line({x1: -0.7, y1: 0, x2: 0.7, y2: 0});
"#;

#[test]
fn full_pipeline_names_pads_and_keeps_order() {
    let normalized = fpscript::compile(SOT23).expect("compile");

    assert_eq!(normalized.len(), 4);
    let names: Vec<_> = normalized.iter().map(|s| s.name.as_deref()).collect();
    assert_eq!(names, vec![Some("1"), Some("2"), Some("3"), None]);

    // Pad 1 is the left pad computed inside the loop.
    assert!(matches!(
        normalized.shapes[0].geometry,
        Geometry::Smd { x, .. } if (x + 0.95).abs() < 1e-9
    ));
}

#[test]
fn metadata_and_compile_are_independent() {
    // Geometry fails at runtime, but the identity declaration still parses.
    let broken = "// @id broken\n// @name Broken\nundefined_fn();\n";

    let meta = extract_metadata(broken).expect("metadata");
    assert_eq!(meta.id, "broken");

    let err = fpscript::compile(broken).unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Runtime {
            kind: RuntimeErrorKind::UndefinedReference,
            ..
        }
    ));
}

#[test]
fn untagged_shapes_default_to_silk() {
    let normalized = fpscript::compile("shape({x1: 0, y1: 0, x2: 1, y2: 1});").expect("compile");
    assert_eq!(normalized.shapes[0].kind, Some(PrimitiveKind::SilkLine));
    assert_eq!(normalized.shapes[0].name, None);
}

#[test]
fn empty_source_compiles_to_empty_footprint() {
    let normalized = fpscript::compile("// @id empty\n// @name Empty\n").expect("compile");
    assert!(normalized.is_empty());
}

#[test]
fn script_can_abort_with_its_own_message() {
    let source = r#"
const pins = 3;
if (pins % 2 !== 0) {
    throw new Error("pin count must be even");
}
"#;
    match fpscript::compile(source).unwrap_err() {
        ScriptError::ScriptThrown { message } => assert_eq!(message, "pin count must be even"),
        other => panic!("expected ScriptThrown, got {other:?}"),
    }
}

#[test]
fn normalized_shapes_serialize_for_renderers() {
    let normalized = fpscript::compile(SOT23).expect("compile");
    let json = serde_json::to_value(&normalized).expect("serialize");

    let shapes = json["shapes"].as_array().expect("shape array");
    assert_eq!(shapes.len(), 4);
    assert_eq!(shapes[0]["kind"], "smd");
    assert_eq!(shapes[0]["name"], "1");
    assert_eq!(shapes[3]["kind"], "silk_line");
}
