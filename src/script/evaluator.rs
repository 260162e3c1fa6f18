//! Sandboxed footprint script evaluation.
//!
//! Scripts are JavaScript, executed with `boa_engine` in a fresh context per
//! call. The context exposes no I/O, filesystem or network capability; the
//! only way a script can affect the host is through the fixed set of shape
//! declaration functions installed by the prelude:
//!
//! ```text
//! pad({x, y, diameter, drill, rotation?})
//! smd({x, y, dx, dy, rotation?})
//! silk_line({x1, y1, x2, y2, width?})
//! silk_arc({x, y, radius, start_angle?, end_angle?, width?})
//! shape({kind?, ...})        // generic form; kind may be omitted
//! ```
//!
//! Each call appends one entry to an accumulator array; after the script
//! finishes the accumulator is read back and validated into a
//! [`RawFootprint`], preserving declaration order even across loops and
//! conditionals.

use boa_engine::{error::JsNativeErrorKind, Context, JsError, Source};
use serde_json::{Map, Value as JsonValue};

use crate::footprint::{Geometry, PrimitiveKind, RawFootprint, ShapeDescriptor, DEFAULT_SILK_WIDTH};
use crate::script::error::{RuntimeErrorKind, ScriptError, ScriptResult};

/// Installed before the user script; defines the capability surface.
///
/// The accumulator is a `const` binding, so user code cannot rebind it, and
/// `Object.assign` snapshots each spec at declaration time so later mutation
/// of the argument object does not alter declared shapes.
const PRELUDE: &str = r#"
"use strict";
const __fp_shapes = [];
function shape(spec) {
    if (spec === null || typeof spec !== "object") {
        throw new TypeError("shape declaration expects an object argument");
    }
    __fp_shapes.push(Object.assign({}, spec));
}
function pad(spec) { shape(Object.assign({}, spec, { kind: "pad" })); }
function smd(spec) { shape(Object.assign({}, spec, { kind: "smd" })); }
function silk_line(spec) { shape(Object.assign({}, spec, { kind: "silk_line" })); }
function silk_arc(spec) { shape(Object.assign({}, spec, { kind: "silk_arc" })); }
"#;

/// Final expression evaluated to read the accumulator back out.
const ACCUMULATOR: &str = "__fp_shapes;";

/// Evaluates a footprint script into a raw shape sequence.
///
/// Each call uses a fresh engine context, so calls are independent and may
/// run concurrently on different sources.
///
/// # Errors
///
/// Returns [`ScriptError::Syntax`] when the source fails to parse,
/// [`ScriptError::Runtime`] when execution fails a host-level check,
/// [`ScriptError::ScriptThrown`] when the script signals failure itself, and
/// [`ScriptError::Host`] on internal evaluator failures.
pub fn evaluate(source: &str) -> ScriptResult<RawFootprint> {
    let mut ctx = Context::default();

    ctx.eval(Source::from_bytes(PRELUDE.as_bytes()))
        .map_err(|e| ScriptError::host(format!("prelude failed to evaluate: {e}")))?;

    // The user script runs as its own eval so diagnostics keep the script's
    // own line numbers.
    if let Err(err) = ctx.eval(Source::from_bytes(source.as_bytes())) {
        return Err(classify(&err, &mut ctx));
    }

    let shapes_val = ctx
        .eval(Source::from_bytes(ACCUMULATOR.as_bytes()))
        .map_err(|e| ScriptError::host(format!("accumulator read failed: {e}")))?;
    let shapes_json = shapes_val
        .to_json(&mut ctx)
        .map_err(|e| classify(&e, &mut ctx))?;
    let specs = shapes_json
        .as_array()
        .ok_or_else(|| ScriptError::host("accumulator is not an array"))?;

    let mut raw = RawFootprint::new();
    for spec in specs {
        raw.push(build_shape(spec)?);
    }

    tracing::debug!(shapes = raw.len(), "Evaluated footprint script");

    Ok(raw)
}

/// Maps an engine error onto the script error taxonomy.
fn classify(err: &JsError, ctx: &mut Context) -> ScriptError {
    match err.try_native(ctx) {
        Ok(native) => {
            let message = native.message().to_string();
            match native.kind {
                JsNativeErrorKind::Syntax => ScriptError::Syntax { message },
                JsNativeErrorKind::Reference => {
                    ScriptError::runtime(RuntimeErrorKind::UndefinedReference, message)
                }
                JsNativeErrorKind::Range => {
                    ScriptError::runtime(RuntimeErrorKind::IndexOutOfRange, message)
                }
                JsNativeErrorKind::Type => {
                    ScriptError::runtime(RuntimeErrorKind::TypeMismatch, message)
                }
                JsNativeErrorKind::Error => ScriptError::ScriptThrown { message },
                _ => ScriptError::host(format!("{err}")),
            }
        }
        // Non-Error thrown values (`throw "reason"`, `throw 42`, ...).
        Err(_) => {
            let message = err.as_opaque().map_or_else(
                || format!("{err}"),
                |value| {
                    value
                        .as_string()
                        .and_then(|s| s.to_std_string().ok())
                        .unwrap_or_else(|| value.display().to_string())
                },
            );
            let message = message.strip_prefix("Error: ").unwrap_or(&message);
            ScriptError::ScriptThrown {
                message: message.to_string(),
            }
        }
    }
}

/// Validates one accumulator entry into a typed shape descriptor.
fn build_shape(spec: &JsonValue) -> ScriptResult<ShapeDescriptor> {
    let obj = spec
        .as_object()
        .ok_or_else(|| ScriptError::type_mismatch("shape declaration expects an object argument"))?;

    let kind = match obj.get("kind") {
        None => None,
        Some(JsonValue::String(s)) => Some(s.as_str()),
        Some(_) => {
            return Err(ScriptError::type_mismatch("shape attribute `kind` must be a string"))
        }
    };

    match kind {
        Some("pad") => build_pad(obj),
        Some("smd") => build_smd(obj),
        Some("silk_line") => build_silk_line(obj),
        Some("silk_arc") => build_silk_arc(obj),
        Some(other) => Err(ScriptError::runtime(
            RuntimeErrorKind::Unimplemented,
            format!("unknown shape kind `{other}`"),
        )),
        // No declared kind: parsed as line geometry, retagged by normalize.
        None => {
            check_fields("shape", obj, &["x1", "y1", "x2", "y2", "width"])?;
            Ok(ShapeDescriptor::untagged(line_geometry("shape", obj)?))
        }
    }
}

fn build_pad(obj: &Map<String, JsonValue>) -> ScriptResult<ShapeDescriptor> {
    check_fields("pad", obj, &["x", "y", "diameter", "drill", "rotation"])?;
    let diameter = positive("pad", "diameter", num("pad", obj, "diameter")?)?;
    let drill = positive("pad", "drill", num("pad", obj, "drill")?)?;
    if drill >= diameter {
        return Err(ScriptError::invalid_attribute(
            "pad: `drill` must be smaller than `diameter`",
        ));
    }
    Ok(ShapeDescriptor::new(
        PrimitiveKind::Pad,
        Geometry::Pad {
            x: num("pad", obj, "x")?,
            y: num("pad", obj, "y")?,
            diameter,
            drill,
            rotation: opt_num("pad", obj, "rotation")?.unwrap_or(0.0),
        },
    ))
}

fn build_smd(obj: &Map<String, JsonValue>) -> ScriptResult<ShapeDescriptor> {
    check_fields("smd", obj, &["x", "y", "dx", "dy", "rotation"])?;
    Ok(ShapeDescriptor::new(
        PrimitiveKind::Smd,
        Geometry::Smd {
            x: num("smd", obj, "x")?,
            y: num("smd", obj, "y")?,
            dx: positive("smd", "dx", num("smd", obj, "dx")?)?,
            dy: positive("smd", "dy", num("smd", obj, "dy")?)?,
            rotation: opt_num("smd", obj, "rotation")?.unwrap_or(0.0),
        },
    ))
}

fn build_silk_line(obj: &Map<String, JsonValue>) -> ScriptResult<ShapeDescriptor> {
    check_fields("silk_line", obj, &["x1", "y1", "x2", "y2", "width"])?;
    Ok(ShapeDescriptor::new(
        PrimitiveKind::SilkLine,
        line_geometry("silk_line", obj)?,
    ))
}

fn build_silk_arc(obj: &Map<String, JsonValue>) -> ScriptResult<ShapeDescriptor> {
    check_fields(
        "silk_arc",
        obj,
        &["x", "y", "radius", "start_angle", "end_angle", "width"],
    )?;
    Ok(ShapeDescriptor::new(
        PrimitiveKind::SilkArc,
        Geometry::Arc {
            x: num("silk_arc", obj, "x")?,
            y: num("silk_arc", obj, "y")?,
            radius: positive("silk_arc", "radius", num("silk_arc", obj, "radius")?)?,
            start_angle: opt_num("silk_arc", obj, "start_angle")?.unwrap_or(0.0),
            end_angle: opt_num("silk_arc", obj, "end_angle")?.unwrap_or(360.0),
            width: silk_width("silk_arc", obj)?,
        },
    ))
}

fn line_geometry(decl: &str, obj: &Map<String, JsonValue>) -> ScriptResult<Geometry> {
    Ok(Geometry::Line {
        x1: num(decl, obj, "x1")?,
        y1: num(decl, obj, "y1")?,
        x2: num(decl, obj, "x2")?,
        y2: num(decl, obj, "y2")?,
        width: silk_width(decl, obj)?,
    })
}

fn silk_width(decl: &str, obj: &Map<String, JsonValue>) -> ScriptResult<f64> {
    match opt_num(decl, obj, "width")? {
        Some(w) => positive(decl, "width", w),
        None => Ok(DEFAULT_SILK_WIDTH),
    }
}

/// Rejects attributes outside the declaration's schema (`kind` is always
/// accepted because the prelude tags it).
fn check_fields(
    decl: &str,
    obj: &Map<String, JsonValue>,
    allowed: &[&str],
) -> ScriptResult<()> {
    for key in obj.keys() {
        if key != "kind" && !allowed.contains(&key.as_str()) {
            return Err(ScriptError::invalid_attribute(format!(
                "{decl}: unknown attribute `{key}`"
            )));
        }
    }
    Ok(())
}

fn num(decl: &str, obj: &Map<String, JsonValue>, key: &str) -> ScriptResult<f64> {
    opt_num(decl, obj, key)?.ok_or_else(|| {
        ScriptError::invalid_attribute(format!("{decl}: missing required attribute `{key}`"))
    })
}

fn opt_num(decl: &str, obj: &Map<String, JsonValue>, key: &str) -> ScriptResult<Option<f64>> {
    match obj.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => {
            let n = value.as_f64().ok_or_else(|| {
                ScriptError::type_mismatch(format!("{decl}: attribute `{key}` must be a number"))
            })?;
            if n.is_finite() {
                Ok(Some(n))
            } else {
                Err(ScriptError::invalid_attribute(format!(
                    "{decl}: attribute `{key}` must be finite"
                )))
            }
        }
    }
}

fn positive(decl: &str, key: &str, value: f64) -> ScriptResult<f64> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ScriptError::invalid_attribute(format!(
            "{decl}: attribute `{key}` must be positive"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_script_yields_empty_footprint() {
        let raw = evaluate("").unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn declares_shapes_in_order() {
        let raw = evaluate(
            r#"
            smd({x: -0.5, y: 0, dx: 0.6, dy: 0.5});
            smd({x: 0.5, y: 0, dx: 0.6, dy: 0.5});
            silk_line({x1: -1, y1: 1, x2: 1, y2: 1});
            "#,
        )
        .unwrap();

        assert_eq!(raw.len(), 3);
        assert_eq!(raw.shapes[0].kind, Some(PrimitiveKind::Smd));
        assert_eq!(raw.shapes[1].kind, Some(PrimitiveKind::Smd));
        assert_eq!(raw.shapes[2].kind, Some(PrimitiveKind::SilkLine));
        assert!(matches!(
            raw.shapes[0].geometry,
            Geometry::Smd { x, .. } if (x + 0.5).abs() < 1e-9
        ));
    }

    #[test]
    fn order_preserved_across_loops_and_conditionals() {
        let raw = evaluate(
            r#"
            for (let i = 0; i < 4; i++) {
                if (i % 2 === 0) {
                    pad({x: i, y: 0, diameter: 1.6, drill: 0.8});
                } else {
                    silk_line({x1: i, y1: 0, x2: i, y2: 1});
                }
            }
            "#,
        )
        .unwrap();

        assert_eq!(raw.len(), 4);
        assert_eq!(raw.shapes[0].kind, Some(PrimitiveKind::Pad));
        assert_eq!(raw.shapes[1].kind, Some(PrimitiveKind::SilkLine));
        assert_eq!(raw.shapes[2].kind, Some(PrimitiveKind::Pad));
        assert_eq!(raw.shapes[3].kind, Some(PrimitiveKind::SilkLine));
    }

    #[test]
    fn shape_without_kind_stays_untagged() {
        let raw = evaluate("shape({x1: 0, y1: 0, x2: 1, y2: 0});").unwrap();
        assert_eq!(raw.shapes[0].kind, None);
        assert!(matches!(raw.shapes[0].geometry, Geometry::Line { .. }));
    }

    #[test]
    fn optional_attributes_take_defaults() {
        let raw = evaluate(
            r#"
            silk_arc({x: 0, y: 0, radius: 1});
            silk_line({x1: 0, y1: 0, x2: 1, y2: 0});
            "#,
        )
        .unwrap();

        assert_eq!(
            raw.shapes[0].geometry,
            Geometry::Arc {
                x: 0.0,
                y: 0.0,
                radius: 1.0,
                start_angle: 0.0,
                end_angle: 360.0,
                width: DEFAULT_SILK_WIDTH,
            }
        );
        assert!(matches!(
            raw.shapes[1].geometry,
            Geometry::Line { width, .. } if (width - DEFAULT_SILK_WIDTH).abs() < 1e-9
        ));
    }

    #[test]
    fn unterminated_block_is_syntax_error() {
        let err = evaluate("if (true) { smd({x: 0, y: 0, dx: 1, dy: 1});").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { .. }), "{err:?}");
    }

    #[test]
    fn undefined_function_is_undefined_reference() {
        let err = evaluate("slot({x: 0, y: 0});").unwrap_err();
        assert!(
            matches!(
                err,
                ScriptError::Runtime {
                    kind: RuntimeErrorKind::UndefinedReference,
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn invalid_array_length_is_index_out_of_range() {
        let err = evaluate("const pins = new Array(-1);").unwrap_err();
        assert!(
            matches!(
                err,
                ScriptError::Runtime {
                    kind: RuntimeErrorKind::IndexOutOfRange,
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn thrown_message_is_verbatim() {
        let err = evaluate(r#"throw new Error("pin count must be even");"#).unwrap_err();
        match err {
            ScriptError::ScriptThrown { message } => {
                assert_eq!(message, "pin count must be even");
            }
            other => panic!("expected ScriptThrown, got {other:?}"),
        }
    }

    #[test]
    fn thrown_string_is_verbatim() {
        let err = evaluate(r#"throw "no geometry";"#).unwrap_err();
        match err {
            ScriptError::ScriptThrown { message } => assert_eq!(message, "no geometry"),
            other => panic!("expected ScriptThrown, got {other:?}"),
        }
    }

    #[test]
    fn unknown_attribute_is_invalid_attribute() {
        let err = evaluate("smd({x: 0, y: 0, dx: 1, dy: 1, dz: 2});").unwrap_err();
        assert!(
            matches!(
                err,
                ScriptError::Runtime {
                    kind: RuntimeErrorKind::InvalidAttribute,
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn missing_required_attribute_is_invalid_attribute() {
        let err = evaluate("smd({x: 0, y: 0, dx: 1});").unwrap_err();
        assert!(
            matches!(
                err,
                ScriptError::Runtime {
                    kind: RuntimeErrorKind::InvalidAttribute,
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn non_numeric_attribute_is_type_mismatch() {
        let err = evaluate(r#"smd({x: "left", y: 0, dx: 1, dy: 1});"#).unwrap_err();
        assert!(
            matches!(
                err,
                ScriptError::Runtime {
                    kind: RuntimeErrorKind::TypeMismatch,
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn unknown_kind_is_unimplemented() {
        let err = evaluate(r#"shape({kind: "keepout", x1: 0, y1: 0, x2: 1, y2: 1});"#).unwrap_err();
        assert!(
            matches!(
                err,
                ScriptError::Runtime {
                    kind: RuntimeErrorKind::Unimplemented,
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn negative_dimension_is_invalid_attribute() {
        let err = evaluate("pad({x: 0, y: 0, diameter: -1.6, drill: 0.8});").unwrap_err();
        assert!(
            matches!(
                err,
                ScriptError::Runtime {
                    kind: RuntimeErrorKind::InvalidAttribute,
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn no_filesystem_capability() {
        let err = evaluate(r#"require("fs");"#).unwrap_err();
        assert!(
            matches!(
                err,
                ScriptError::Runtime {
                    kind: RuntimeErrorKind::UndefinedReference,
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn calls_are_independent() {
        let source = "smd({x: 0, y: 0, dx: 1, dy: 1});";
        let first = evaluate(source).unwrap();
        let second = evaluate(source).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn concurrent_evaluation_on_independent_sources() {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                std::thread::spawn(move || {
                    let source = format!("smd({{x: {i}, y: 0, dx: 1, dy: 1}});");
                    evaluate(&source).unwrap().len()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
