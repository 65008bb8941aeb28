//! Whole-library write-then-read round trips against an in-memory buffer.

use std::io::Cursor;

use gds_core::{ArrayRef, Boundary, Library, Point, StructureRef, TextElement, Timestamp, Transform};
use gds_io::{load, save, GdsReadOptions, GdsWriteOptions};

fn roundtrip(library: &Library, roots: &[gds_core::CellId]) -> Library {
    let _ = env_logger::try_init();
    let mut buf = Vec::new();
    save(&mut buf, library, roots, &GdsWriteOptions::default(), Timestamp::epoch()).unwrap();
    let mut cursor = Cursor::new(buf);
    load(&mut cursor, &GdsReadOptions::default()).unwrap()
}

#[test]
fn empty_library_with_one_empty_cell() {
    let mut lib = Library::new("LIB", 0.001, 1.0);
    let a = lib.add_cell("A");

    let loaded = roundtrip(&lib, &[a]);
    assert_eq!(loaded.cell_count(), 1);
    let cell = loaded.cell(loaded.find_by_name("A").unwrap()).unwrap();
    assert_eq!(cell.elements.len(), 0);
}

#[test]
fn polygon_vertices_survive_at_one_nanometer_scale() {
    let mut lib = Library::new("LIB", 0.001, 1.0);
    let a = lib.add_cell("A");
    lib.cell_mut(a).unwrap().add_boundary(Boundary::new(
        2,
        0,
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ],
    ));

    let loaded = roundtrip(&lib, &[a]);
    let cell = loaded.cell(loaded.find_by_name("A").unwrap()).unwrap();
    let boundary = cell.boundaries().next().unwrap();
    assert_eq!(boundary.layer, 2);
    assert_eq!(boundary.datatype, 0);
    assert_eq!(boundary.vertices.len(), 4);
    assert!((boundary.vertices[2].x - 1.0).abs() < 1e-9);
    assert!((boundary.vertices[2].y - 1.0).abs() < 1e-9);
}

#[test]
fn sref_with_reflection_and_rotation_resolves_after_load() {
    let mut lib = Library::new("LIB", 0.001, 1.0);
    let c = lib.add_cell("C");
    let p = lib.add_cell("P");
    lib.cell_mut(p).unwrap().add_sref(StructureRef {
        target: c,
        target_name: "C".to_string(),
        origin: Point::new(5.0, 0.0),
        transform: Transform::new(true, 1.0, 90.0),
    });

    let loaded = roundtrip(&lib, &[p]);
    let p_cell = loaded.cell(loaded.find_by_name("P").unwrap()).unwrap();
    assert_eq!(p_cell.srefs.len(), 1);
    let sref = &p_cell.srefs[0];
    assert!(sref.transform.reflect_x);
    assert!((sref.transform.rotation_deg - 90.0).abs() < 1e-9);
    assert!((sref.origin.x - 5.0).abs() < 1e-9);
    // MAG is omitted on the wire when magnification is 1.0, so it must
    // decode back to the neutral value rather than some leftover default.
    assert_eq!(sref.transform.mag, 1.0);
    assert!(loaded.find_by_name(&sref.target_name).is_some());
}

#[test]
fn three_by_two_aref_recovers_delta_vectors() {
    let mut lib = Library::new("LIB", 0.001, 1.0);
    let c = lib.add_cell("C");
    let p = lib.add_cell("P");
    lib.cell_mut(p).unwrap().add_aref(ArrayRef {
        target: c,
        target_name: "C".to_string(),
        origin: Point::origin(),
        transform: Transform::default(),
        columns: 3,
        rows: 2,
        delta_col: Point::new(10.0, 0.0),
        delta_row: Point::new(0.0, 20.0),
    });

    let loaded = roundtrip(&lib, &[p]);
    let p_cell = loaded.cell(loaded.find_by_name("P").unwrap()).unwrap();
    let aref = &p_cell.arefs[0];
    assert_eq!(aref.columns, 3);
    assert_eq!(aref.rows, 2);
    assert!((aref.delta_col.x - 10.0).abs() < 1e-9);
    assert!((aref.delta_col.y - 0.0).abs() < 1e-9);
    assert!((aref.delta_row.x - 0.0).abs() < 1e-9);
    assert!((aref.delta_row.y - 20.0).abs() < 1e-9);
}

#[test]
fn text_width_sign_and_presentation_round_trip() {
    let mut lib = Library::new("LIB", 0.001, 1.0);
    let a = lib.add_cell("A");
    lib.cell_mut(a).unwrap().add_text(TextElement {
        layer: 5,
        texttype: 1,
        anchor: Point::new(2.0, 3.0),
        string: "HELLO".to_string(),
        presentation: Default::default(),
        can_scale: false,
        width: 1.0,
        transform: Transform::default(),
    });

    let loaded = roundtrip(&lib, &[a]);
    let cell = loaded.cell(loaded.find_by_name("A").unwrap()).unwrap();
    let text = cell.texts().next().unwrap();
    assert_eq!(text.string, "HELLO");
    assert!(!text.can_scale);
    assert!((text.width - 1.0).abs() < 1e-9);
    assert_eq!(text.presentation.to_bits(), 0x00);
}

#[test]
fn units_record_of_2_4_micrometers_is_preserved() {
    let mut lib = Library::new("LIB", 2.4, 1.0);
    let a = lib.add_cell("A");
    lib.cell_mut(a).unwrap().add_boundary(Boundary::new(
        1,
        0,
        vec![Point::new(0.0, 0.0), Point::new(2.4, 0.0), Point::new(2.4, 2.4)],
    ));

    let loaded = roundtrip(&lib, &[a]);
    assert!((loaded.dbu_in_um - 2.4).abs() < 1e-6);
    let cell = loaded.cell(loaded.find_by_name("A").unwrap()).unwrap();
    let boundary = cell.boundaries().next().unwrap();
    assert!((boundary.vertices[1].x - 2.4).abs() < 1e-6);
}
