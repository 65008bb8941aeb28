//! GDSII stream writer: serializes a `gds_core::Library` back to bytes.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use gds_core::{Cell, CellId, HasLayer, Library, Point, Timestamp, Transform};

use crate::error::GdsError;
use crate::record::{self, token};
use crate::scale;

/// Writes a full GDSII stream: HEADER, BGNLIB/LIBNAME/UNITS, every cell
/// reachable from `roots` in dependency order (leaves first), ENDLIB.
///
/// `modify` is substituted for every structure's and the library's
/// modification timestamp regardless of what the in-memory cell carries;
/// `created` timestamps pass through unchanged. Per §5, this function
/// reads no wall-clock time itself — the caller (the orchestration layer)
/// decides what "now" means.
pub fn write_library<W: Write>(
    writer: &mut W,
    library: &Library,
    roots: &[CellId],
    name: &str,
    userunit_in_um: f64,
    modify: Timestamp,
) -> Result<(), GdsError> {
    let order = dependency_order(library, roots)?;

    write_header(writer, name, library.dbu_in_um, userunit_in_um, modify, library.accessed)?;

    let mut name_table: HashMap<String, CellId> = HashMap::new();
    for &id in &order {
        let cell = library.cell(id).expect("dependency_order only yields valid ids");
        let key = cell.name.to_lowercase();
        match name_table.get(&key) {
            Some(&existing) if existing != id => {
                log::warn!(
                    "duplicate structure name '{}' (case-insensitive) written more than once",
                    cell.name
                );
            }
            _ => {
                name_table.insert(key, id);
            }
        }
        write_structure(writer, library, cell, modify)?;
    }

    record::write_empty(writer, token::ENDLIB)?;
    Ok(())
}

fn write_header<W: Write>(
    writer: &mut W,
    name: &str,
    dbu_in_um: f64,
    userunit_in_um: f64,
    modify: Timestamp,
    accessed: Timestamp,
) -> Result<(), GdsError> {
    writer.write_all(&[0x00, 0x06, 0x00, 0x02, 0x02, 0x58]).map_err(|e| GdsError::Io {
        offset: 0,
        message: e.to_string(),
    })?; // HEADER, version 600

    if Library::check_name_length(name).is_err() {
        log::warn!("library name '{name}' exceeds the 32-character GDSII name limit");
    }

    let dates = timestamp_pair(modify, accessed);
    record::write_i16s(writer, token::BGNLIB, &dates)?;
    record::write_ascii(writer, token::LIBNAME, name)?;

    let db_in_meters = dbu_in_um * 1e-6;
    let user_per_db = if userunit_in_um != 0.0 {
        dbu_in_um / userunit_in_um
    } else {
        1.0
    };
    record::write_reals_checked(writer, token::UNITS, &[user_per_db, db_in_meters])?;
    Ok(())
}

fn timestamp_pair(a: Timestamp, b: Timestamp) -> [i16; 12] {
    [
        a.year, a.month, a.day, a.hour, a.minute, a.second, b.year, b.month, b.day, b.hour, b.minute, b.second,
    ]
}

/// Post-order depth-first traversal over the reference graph rooted at
/// `roots`: a cell is pushed only after every cell it references has been
/// pushed, which yields a leaves-first linear order directly. A cell
/// revisited while still on the current DFS path is a dependency cycle.
pub(crate) fn dependency_order(library: &Library, roots: &[CellId]) -> Result<Vec<CellId>, GdsError> {
    let mut order = Vec::new();
    let mut done: HashSet<CellId> = HashSet::new();
    let mut on_stack: HashSet<CellId> = HashSet::new();
    let mut path: Vec<String> = Vec::new();

    for &root in roots {
        visit(library, root, &mut order, &mut done, &mut on_stack, &mut path)?;
    }
    Ok(order)
}

fn visit(
    library: &Library,
    id: CellId,
    order: &mut Vec<CellId>,
    done: &mut HashSet<CellId>,
    on_stack: &mut HashSet<CellId>,
    path: &mut Vec<String>,
) -> Result<(), GdsError> {
    if done.contains(&id) {
        return Ok(());
    }
    let cell = match library.cell(id) {
        Some(c) => c,
        None => return Ok(()), // stale id, nothing to emit
    };

    if on_stack.contains(&id) {
        path.push(cell.name.clone());
        return Err(GdsError::DependencyCycle(path.join(" -> ")));
    }

    on_stack.insert(id);
    path.push(cell.name.clone());

    for sref in &cell.srefs {
        visit(library, sref.target, order, done, on_stack, path)?;
    }
    for aref in &cell.arefs {
        visit(library, aref.target, order, done, on_stack, path)?;
    }

    path.pop();
    on_stack.remove(&id);
    done.insert(id);
    order.push(id);
    Ok(())
}

fn write_structure<W: Write>(writer: &mut W, library: &Library, cell: &Cell, modify: Timestamp) -> Result<(), GdsError> {
    if Library::check_name_length(&cell.name).is_err() {
        log::warn!("structure name '{}' exceeds the 32-character GDSII name limit", cell.name);
    }

    let dates = timestamp_pair(cell.created, modify);
    record::write_i16s(writer, token::BGNSTR, &dates)?;
    record::write_ascii(writer, token::STRNAME, &cell.name)?;

    for boundary in cell.boundaries() {
        write_boundary(writer, boundary, library.dbu_in_um)?;
    }
    for sref in &cell.srefs {
        write_sref(writer, library, sref)?;
    }
    for aref in &cell.arefs {
        write_aref(writer, library, aref)?;
    }
    for text in cell.texts() {
        write_text(writer, text, library.dbu_in_um)?;
    }

    record::write_empty(writer, token::ENDSTR)?;
    Ok(())
}

fn write_boundary<W: Write>(writer: &mut W, boundary: &gds_core::Boundary, dbu_in_um: f64) -> Result<(), GdsError> {
    if !boundary.layerspec().in_range() {
        log::warn!(
            "boundary layer/datatype ({}, {}) outside the conventional [0, 63] range",
            boundary.layer,
            boundary.datatype
        );
    }
    record::write_empty(writer, token::BOUNDARY)?;
    record::write_i16s(writer, token::LAYER, &[boundary.layer as i16])?;
    record::write_i16s(writer, token::DATATYPE, &[boundary.datatype as i16])?;

    let mut xy = Vec::with_capacity((boundary.vertices.len() + 1) * 2);
    for v in &boundary.vertices {
        xy.push(scale::length_to_grid(v.x, dbu_in_um)?);
        xy.push(scale::length_to_grid(v.y, dbu_in_um)?);
    }
    if let Some(first) = boundary.vertices.first() {
        xy.push(scale::length_to_grid(first.x, dbu_in_um)?);
        xy.push(scale::length_to_grid(first.y, dbu_in_um)?);
    }
    record::write_i32s(writer, token::XY, &xy)?;

    record::write_empty(writer, token::ENDEL)?;
    Ok(())
}

fn write_transform<W: Write>(writer: &mut W, transform: &Transform) -> Result<(), GdsError> {
    if transform.is_neutral() {
        return Ok(());
    }
    let bits: u16 = if transform.reflect_x { 0x8000 } else { 0 };
    record::write_bits(writer, token::STRANS, bits)?;
    if transform.mag != 1.0 {
        record::write_reals_checked(writer, token::MAG, &[transform.mag])?;
    }
    if transform.rotation_deg != 0.0 {
        record::write_reals_checked(writer, token::ANGLE, &[transform.rotation_deg])?;
    }
    Ok(())
}

fn write_sref<W: Write>(writer: &mut W, library: &Library, sref: &gds_core::StructureRef) -> Result<(), GdsError> {
    record::write_empty(writer, token::SREF)?;
    record::write_ascii(writer, token::SNAME, &sref.target_name)?;
    write_transform(writer, &sref.transform)?;

    let dbu_in_um = library.dbu_in_um;
    let xy = [
        scale::length_to_grid(sref.origin.x, dbu_in_um)?,
        scale::length_to_grid(sref.origin.y, dbu_in_um)?,
    ];
    record::write_i32s(writer, token::XY, &xy)?;

    record::write_empty(writer, token::ENDEL)?;
    Ok(())
}

fn write_aref<W: Write>(writer: &mut W, library: &Library, aref: &gds_core::ArrayRef) -> Result<(), GdsError> {
    record::write_empty(writer, token::AREF)?;
    record::write_ascii(writer, token::SNAME, &aref.target_name)?;
    write_transform(writer, &aref.transform)?;

    if !aref.counts_in_range() {
        log::warn!(
            "AREF column/row count ({}, {}) outside the [0, 32767] range",
            aref.columns,
            aref.rows
        );
    }
    record::write_i16s(writer, token::COLROW, &[aref.columns as i16, aref.rows as i16])?;

    let dbu_in_um = library.dbu_in_um;
    let end_of_cols = Point::new(
        aref.origin.x + aref.columns as f64 * aref.delta_col.x,
        aref.origin.y + aref.columns as f64 * aref.delta_col.y,
    );
    let end_of_rows = Point::new(
        aref.origin.x + aref.rows as f64 * aref.delta_row.x,
        aref.origin.y + aref.rows as f64 * aref.delta_row.y,
    );
    let mut xy = Vec::with_capacity(6);
    for p in [aref.origin, end_of_cols, end_of_rows] {
        xy.push(scale::length_to_grid(p.x, dbu_in_um)?);
        xy.push(scale::length_to_grid(p.y, dbu_in_um)?);
    }
    record::write_i32s(writer, token::XY, &xy)?;

    record::write_empty(writer, token::ENDEL)?;
    Ok(())
}

fn write_text<W: Write>(writer: &mut W, text: &gds_core::TextElement, dbu_in_um: f64) -> Result<(), GdsError> {
    if !text.layerspec().in_range() {
        log::warn!(
            "text layer/texttype ({}, {}) outside the conventional [0, 63] range",
            text.layer,
            text.texttype
        );
    }
    record::write_empty(writer, token::TEXT)?;
    record::write_i16s(writer, token::LAYER, &[text.layer as i16])?;
    record::write_i16s(writer, token::TEXTTYPE, &[text.texttype as i16])?;
    record::write_bits(writer, token::PRESENTATION, text.presentation.to_bits() as u16)?;

    let width_grid = scale::length_to_grid(text.width, dbu_in_um)?;
    let signed_width = if text.can_scale { width_grid } else { -width_grid };
    record::write_i32s(writer, token::WIDTH, &[signed_width])?;

    write_transform(writer, &text.transform)?;

    let xy = [
        scale::length_to_grid(text.anchor.x, dbu_in_um)?,
        scale::length_to_grid(text.anchor.y, dbu_in_um)?,
    ];
    record::write_i32s(writer, token::XY, &xy)?;
    record::write_ascii(writer, token::STRING, &text.string)?;

    record::write_empty(writer, token::ENDEL)?;
    Ok(())
}
