//! Export tests: determinism, atomic replacement, and round-tripping pad
//! designators through the emitted Eagle document.

use std::path::Path;

use fpscript::export::{export, serialize, ExportEntry, ExportFormat};
use fpscript::script::extract_metadata;
use tempfile::TempDir;

const R0402: &str = "\
// @id r0402
// @name R0402
// @desc Chip resistor 0402

smd({x: -0.5, y: 0, dx: 0.6, dy: 0.5});
smd({x: 0.5, y: 0, dx: 0.6, dy: 0.5});
silk_line({x1: -1, y1: 0.6, x2: 1, y2: 0.6});
";

fn entry(source: &str) -> ExportEntry {
    ExportEntry {
        metadata: extract_metadata(source).expect("metadata"),
        footprint: fpscript::compile(source).expect("compile"),
    }
}

#[test]
fn export_writes_library_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("out.lbr");

    export(&path, ExportFormat::Eagle, &[entry(R0402)]).expect("export");

    let doc = std::fs::read_to_string(&path).expect("read back");
    assert!(doc.contains("<package name=\"r0402\">"));
    assert!(doc.contains("<description>Chip resistor 0402</description>"));
}

#[test]
fn exported_designators_match_normalization() {
    let doc = serialize(ExportFormat::Eagle, &[entry(R0402)]);

    // Two pad-like declarations yield two pad elements named "1" and "2".
    assert_eq!(doc.matches("<smd ").count(), 2);
    assert!(doc.contains("<smd name=\"1\""));
    assert!(doc.contains("<smd name=\"2\""));
    // The silk line carries no designator.
    assert_eq!(doc.matches("<wire ").count(), 1);
}

#[test]
fn successive_exports_are_byte_identical() {
    let dir = TempDir::new().expect("temp dir");
    let first_path = dir.path().join("first.lbr");
    let second_path = dir.path().join("second.lbr");
    let entries = vec![entry(R0402)];

    export(&first_path, ExportFormat::Eagle, &entries).expect("export");
    export(&second_path, ExportFormat::Eagle, &entries).expect("export");

    let first = std::fs::read(&first_path).expect("read");
    let second = std::fs::read(&second_path).expect("read");
    assert_eq!(first, second);
}

#[test]
fn default_arc_exports_as_full_circle() {
    // silk_arc without angles sweeps the full revolution; the document must
    // keep the radius rather than emit a wire with coincident endpoints.
    let doc = serialize(
        ExportFormat::Eagle,
        &[entry("// @id ring\n// @name Ring\nsilk_arc({x: 0, y: 0, radius: 2});\n")],
    );
    assert!(doc.contains("<circle x=\"0\" y=\"0\" radius=\"2\" width=\"0.15\" layer=\"21\"/>"));
    assert!(!doc.contains("curve=\"360\""));
}

#[test]
fn empty_export_is_minimal_well_formed_document() {
    let doc = serialize(ExportFormat::Eagle, &[]);
    assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"));
    assert!(doc.contains("<packages>\n</packages>"));
    assert!(!doc.contains("<package "));
}

#[cfg(unix)]
#[test]
fn failed_export_leaves_existing_file_untouched() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("lib.lbr");
    export(&path, ExportFormat::Eagle, &[entry(R0402)]).expect("export");
    let before = std::fs::read(&path).expect("read");

    // Make the target directory read-only so the temp file cannot be created.
    let mut perms = std::fs::metadata(dir.path()).expect("meta").permissions();
    let original = perms.clone();
    perms.set_mode(0o555);
    std::fs::set_permissions(dir.path(), perms).expect("chmod");

    let result = export(&path, ExportFormat::Eagle, &[entry(R0402)]);
    assert!(result.is_err());

    std::fs::set_permissions(dir.path(), original).expect("chmod back");
    let after = std::fs::read(&path).expect("read");
    assert_eq!(before, after);
}

#[test]
fn export_to_missing_directory_fails_cleanly() {
    let missing = Path::new("/nonexistent/fpscript-test/out.lbr");
    let err = export(missing, ExportFormat::Eagle, &[]).unwrap_err();
    assert!(err.to_string().contains("out.lbr"));
    assert!(!missing.exists());
}
