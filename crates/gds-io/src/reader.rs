//! GDSII stream reader: parses a byte stream into a `gds_core::Library`.
//!
//! Two passes. The first walks the record stream once, building cells with
//! concrete geometry but reference stubs that only know their target's
//! name. The second resolves those stubs against the library's name index,
//! which lets a structure reference another structure defined later in the
//! stream without any lookahead.

use std::io::Read;

use gds_core::{
    Boundary, Library, Point, Presentation, TextElement, Timestamp, Transform, UnresolvedArrayRef,
    UnresolvedRef,
};

use crate::error::GdsError;
use crate::record::{self, describe_token, read_record, token, RawRecord};
use crate::scale::DbUnit;

/// Options controlling a read operation.
#[derive(Debug, Clone, Copy)]
pub struct GdsReadOptions {
    /// Discard database-unit scaling entirely; report every coordinate as
    /// a raw micrometer value instead of through `Library::dbu_in_um`.
    pub nounits: bool,
    pub verbose: bool,
}

impl Default for GdsReadOptions {
    fn default() -> Self {
        Self {
            nounits: false,
            verbose: false,
        }
    }
}

struct ParsedStruct {
    name: String,
    created: Timestamp,
    modified: Timestamp,
    elements: Vec<gds_core::Element>,
    srefs: Vec<UnresolvedRef>,
    arefs: Vec<UnresolvedArrayRef>,
}

/// Reads an entire GDSII stream, returning the populated library and the
/// 8-bit version number carried in the magic header.
pub fn read_library<R: Read>(reader: &mut R, options: &GdsReadOptions) -> Result<(Library, u8), GdsError> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic).map_err(|e| GdsError::Io {
        offset: 0,
        message: e.to_string(),
    })?;
    if magic[0..4] != [0x00, 0x06, 0x00, 0x02] {
        return Err(GdsError::BadMagic {
            found: magic.to_vec(),
        });
    }
    let version = magic[5];
    log::info!("reading GDSII stream, version {version}");

    let mut bytes_read: u64 = 6;
    let mut lib_name = String::from("GDSIILIB");
    let mut dbu_in_um = 0.001; // 1 nm, until UNITS says otherwise
    let mut user_unit_in_um = 1.0;
    let mut lib_created = Timestamp::epoch();
    let mut lib_accessed = Timestamp::epoch();
    let mut pending_structs: Vec<ParsedStruct> = Vec::new();
    let mut first_after_header = true;
    let mut saw_endlib = false;

    loop {
        let rec = match read_record(reader, &mut bytes_read)? {
            Some(r) => r,
            None => break,
        };

        if first_after_header && rec.token != token::BGNLIB {
            log::warn!(
                "expected BGNLIB as the first record after HEADER, found {} at offset {}",
                describe_token(rec.token),
                rec.offset
            );
        }
        first_after_header = false;

        match rec.token {
            token::BGNLIB => {
                // BGNLIB's date array has no separate creation date, only
                // modification followed by access; stored in `created`
                // for symmetry with `Cell`, which does track both.
                let dates = rec.as_i16_vec();
                if dates.len() >= 12 {
                    lib_created = timestamp_from_slice(&dates[0..6]);
                    lib_accessed = timestamp_from_slice(&dates[6..12]);
                }
            }
            token::LIBNAME => {
                lib_name = rec.as_string();
                log::info!("library name: {lib_name}");
            }
            token::UNITS => {
                let reals = rec.as_f64_vec();
                if reals.len() == 2 {
                    let user_per_db = reals[0];
                    let db_in_meters = reals[1];
                    let unit = DbUnit::snap(db_in_meters);
                    dbu_in_um = unit.in_um();
                    user_unit_in_um = if user_per_db != 0.0 {
                        dbu_in_um / user_per_db
                    } else {
                        dbu_in_um
                    };
                }
            }
            token::BGNSTR => {
                let dates = rec.as_i16_vec();
                let created = if dates.len() >= 6 {
                    timestamp_from_slice(&dates[0..6])
                } else {
                    Timestamp::epoch()
                };
                let modified = if dates.len() >= 12 {
                    timestamp_from_slice(&dates[6..12])
                } else {
                    Timestamp::epoch()
                };
                let parsed = parse_structure(reader, &mut bytes_read, created, modified, dbu_in_um)?;
                pending_structs.push(parsed);
            }
            token::ENDLIB => {
                saw_endlib = true;
                break;
            }
            other => {
                log::warn!(
                    "unrecognized or unimplemented library-scope record {} at offset {}, skipping",
                    describe_token(other),
                    rec.offset
                );
            }
        }
    }

    if !saw_endlib {
        log::warn!("stream ended without an ENDLIB record");
    }

    let effective_dbu = if options.nounits { 1.0 } else { dbu_in_um };
    let mut library = Library::new(lib_name, effective_dbu, user_unit_in_um);
    library.created = lib_created;
    library.accessed = lib_accessed;

    for parsed in &pending_structs {
        if library.find_by_name(&parsed.name).is_some() {
            log::warn!("duplicate structure name '{}' (case-insensitive)", parsed.name);
        }
        if Library::check_name_length(&parsed.name).is_err() {
            log::warn!("structure name '{}' exceeds the 32-character GDSII name limit", parsed.name);
        }
        let id = library.add_cell(parsed.name.clone());
        let cell = library.cell_mut(id).expect("cell just inserted");
        cell.created = parsed.created;
        cell.modified = parsed.modified;
        cell.elements = parsed.elements.clone();
    }

    resolve_references(&mut library, &pending_structs)?;

    if options.verbose {
        log::info!("loaded {} structures", library.cell_count());
    }

    Ok((library, version))
}

fn timestamp_from_slice(s: &[i16]) -> Timestamp {
    Timestamp::new(s[0], s[1], s[2], s[3], s[4], s[5])
}

fn resolve_references(library: &mut Library, structs: &[ParsedStruct]) -> Result<(), GdsError> {
    for (i, parsed) in structs.iter().enumerate() {
        let id = gds_core::CellId(i);

        let mut srefs = Vec::with_capacity(parsed.srefs.len());
        for stub in &parsed.srefs {
            let target = library
                .find_by_name(&stub.target_name)
                .ok_or_else(|| GdsError::UndefinedStructure(stub.target_name.clone()))?;
            srefs.push(gds_core::StructureRef {
                target,
                target_name: stub.target_name.clone(),
                origin: stub.origin,
                transform: stub.transform,
            });
        }

        let mut arefs = Vec::with_capacity(parsed.arefs.len());
        for stub in &parsed.arefs {
            let target = library
                .find_by_name(&stub.target_name)
                .ok_or_else(|| GdsError::UndefinedStructure(stub.target_name.clone()))?;
            arefs.push(gds_core::ArrayRef {
                target,
                target_name: stub.target_name.clone(),
                origin: stub.origin,
                transform: stub.transform,
                columns: stub.columns,
                rows: stub.rows,
                delta_col: stub.delta_col,
                delta_row: stub.delta_row,
            });
        }

        let cell = library.cell_mut(id).expect("cell indices are dense");
        cell.srefs = srefs;
        cell.arefs = arefs;
    }
    Ok(())
}

/// Sub-records tolerated but unimplemented within any element: accepted at
/// most once, warned, payload discarded.
fn is_tolerant_skip(t: u16) -> bool {
    matches!(t, token::EFLAGS | token::PLEX | token::PATHTYPE)
}

/// Tracks PROPATTR/PROPVALUE pairing within an element. Properties carry
/// no counterpart in the collaborator model (§6 lists no property-bag
/// field), so their content is discarded; only the pairing order is
/// enforced, per §4.5.
#[derive(Default)]
struct PropertyState {
    awaiting_value: bool,
}

impl PropertyState {
    fn apply_attr(&mut self, rec: &RawRecord) -> Result<(), GdsError> {
        if self.awaiting_value {
            return Err(GdsError::UnexpectedToken {
                offset: rec.offset,
                token: token::PROPATTR,
                token_name: "PROPATTR".to_string(),
                expected: "PROPVALUE to follow the previous PROPATTR",
            });
        }
        self.awaiting_value = true;
        Ok(())
    }

    fn apply_value(&mut self, rec: &RawRecord) -> Result<(), GdsError> {
        if !self.awaiting_value {
            return Err(GdsError::UnexpectedToken {
                offset: rec.offset,
                token: token::PROPVALUE,
                token_name: "PROPVALUE".to_string(),
                expected: "a preceding PROPATTR",
            });
        }
        self.awaiting_value = false;
        Ok(())
    }

    fn finish(&self, offset: u64, element: &'static str) -> Result<(), GdsError> {
        if self.awaiting_value {
            return Err(missing(offset, element, "PROPVALUE"));
        }
        Ok(())
    }
}

fn parse_structure<R: Read>(
    reader: &mut R,
    bytes_read: &mut u64,
    created: Timestamp,
    modified: Timestamp,
    dbu_in_um: f64,
) -> Result<ParsedStruct, GdsError> {
    let mut name = String::new();
    let mut elements = Vec::new();
    let mut srefs = Vec::new();
    let mut arefs = Vec::new();

    loop {
        let rec = read_record(reader, bytes_read)?.ok_or(GdsError::Io {
            offset: *bytes_read,
            message: "unexpected end of stream inside structure".to_string(),
        })?;

        match rec.token {
            token::STRNAME => name = rec.as_string(),
            token::BOUNDARY => elements.push(gds_core::Element::Boundary(parse_boundary(
                reader, bytes_read, dbu_in_um,
            )?)),
            token::TEXT => elements.push(gds_core::Element::Text(parse_text(reader, bytes_read, dbu_in_um)?)),
            token::SREF => srefs.push(parse_sref(reader, bytes_read, dbu_in_um)?),
            token::AREF => arefs.push(parse_aref(reader, bytes_read, dbu_in_um)?),
            token::ENDSTR => break,
            other => {
                return Err(GdsError::UnexpectedToken {
                    offset: rec.offset,
                    token: other,
                    token_name: describe_token(other),
                    expected: "a boundary, text, reference, or ENDSTR within a structure",
                })
            }
        }
    }

    Ok(ParsedStruct {
        name,
        created,
        modified,
        elements,
        srefs,
        arefs,
    })
}

fn decode_xy_pairs(rec: &RawRecord, dbu_in_um: f64) -> Vec<Point> {
    rec.as_i32_vec()
        .chunks_exact(2)
        .map(|c| Point::new(c[0] as f64 * dbu_in_um, c[1] as f64 * dbu_in_um))
        .collect()
}

fn parse_boundary<R: Read>(reader: &mut R, bytes_read: &mut u64, dbu_in_um: f64) -> Result<Boundary, GdsError> {
    let mut layer: Option<u16> = None;
    let mut datatype: Option<u16> = None;
    let mut xy: Option<Vec<Point>> = None;
    let mut seen_tolerant: Vec<u16> = Vec::new();
    let mut props = PropertyState::default();

    loop {
        let rec = read_record(reader, bytes_read)?.ok_or(GdsError::Io {
            offset: *bytes_read,
            message: "unexpected end of stream inside boundary".to_string(),
        })?;

        match rec.token {
            token::LAYER => set_once(&mut layer, first_i16(&rec) as u16, &rec, "BOUNDARY", "LAYER")?,
            token::DATATYPE => set_once(&mut datatype, first_i16(&rec) as u16, &rec, "BOUNDARY", "DATATYPE")?,
            token::XY => {
                if xy.is_some() {
                    return Err(duplicate(&rec, "BOUNDARY", "XY"));
                }
                let points = decode_xy_pairs(&rec, dbu_in_um);
                let n_points = points.len().saturating_sub(1);
                xy = Some(points.into_iter().take(n_points).collect());
            }
            token::PROPATTR => props.apply_attr(&rec)?,
            token::PROPVALUE => props.apply_value(&rec)?,
            token::ENDEL => break,
            t if is_tolerant_skip(t) => warn_tolerant(t, &rec, &mut seen_tolerant)?,
            other => {
                return Err(GdsError::UnexpectedToken {
                    offset: rec.offset,
                    token: other,
                    token_name: describe_token(other),
                    expected: "a BOUNDARY sub-record or ENDEL",
                })
            }
        }
    }
    props.finish(*bytes_read, "BOUNDARY")?;

    let layer = layer.ok_or_else(|| missing(*bytes_read, "BOUNDARY", "LAYER"))?;
    let datatype = datatype.ok_or_else(|| missing(*bytes_read, "BOUNDARY", "DATATYPE"))?;
    let vertices = xy.ok_or_else(|| missing(*bytes_read, "BOUNDARY", "XY"))?;

    if layer > 63 || datatype > 63 {
        log::warn!("boundary layer/datatype ({layer}, {datatype}) outside the conventional [0, 63] range");
    }

    Ok(Boundary::new(layer, datatype, vertices))
}

fn parse_text<R: Read>(reader: &mut R, bytes_read: &mut u64, dbu_in_um: f64) -> Result<TextElement, GdsError> {
    let mut layer: Option<u16> = None;
    let mut texttype: Option<u16> = None;
    let mut presentation = Presentation::default();
    let mut width: Option<i32> = None;
    let mut xy: Option<Point> = None;
    let mut string: Option<String> = None;
    let mut transform_state = TransformState::default();
    let mut seen_tolerant: Vec<u16> = Vec::new();
    let mut props = PropertyState::default();

    loop {
        let rec = read_record(reader, bytes_read)?.ok_or(GdsError::Io {
            offset: *bytes_read,
            message: "unexpected end of stream inside text element".to_string(),
        })?;

        match rec.token {
            token::LAYER => set_once(&mut layer, first_i16(&rec) as u16, &rec, "TEXT", "LAYER")?,
            token::TEXTTYPE => set_once(&mut texttype, first_i16(&rec) as u16, &rec, "TEXT", "TEXTTYPE")?,
            token::PRESENTATION => {
                let bytes = &rec.payload;
                let low_byte = if bytes.len() >= 2 { bytes[1] } else { 0 };
                presentation = Presentation::from_bits(low_byte);
            }
            token::WIDTH => set_once(&mut width, first_i32(&rec), &rec, "TEXT", "WIDTH")?,
            token::XY => {
                if xy.is_some() {
                    return Err(duplicate(&rec, "TEXT", "XY"));
                }
                let points = decode_xy_pairs(&rec, dbu_in_um);
                xy = points.into_iter().next();
            }
            token::STRING => set_once(&mut string, rec.as_string(), &rec, "TEXT", "STRING")?,
            token::STRANS => transform_state.apply_strans(&rec)?,
            token::MAG => transform_state.apply_mag(&rec)?,
            token::ANGLE => transform_state.apply_angle(&rec)?,
            token::PROPATTR => props.apply_attr(&rec)?,
            token::PROPVALUE => props.apply_value(&rec)?,
            token::ENDEL => break,
            t if is_tolerant_skip(t) => warn_tolerant(t, &rec, &mut seen_tolerant)?,
            other => {
                return Err(GdsError::UnexpectedToken {
                    offset: rec.offset,
                    token: other,
                    token_name: describe_token(other),
                    expected: "a TEXT sub-record or ENDEL",
                })
            }
        }
    }
    props.finish(*bytes_read, "TEXT")?;

    let layer = layer.ok_or_else(|| missing(*bytes_read, "TEXT", "LAYER"))?;
    let texttype = texttype.unwrap_or(0);
    let anchor = xy.ok_or_else(|| missing(*bytes_read, "TEXT", "XY"))?;
    let string = string.ok_or_else(|| missing(*bytes_read, "TEXT", "STRING"))?;
    let raw_width = width.unwrap_or(0);

    if layer > 63 || texttype > 63 {
        log::warn!("text layer/texttype ({layer}, {texttype}) outside the conventional [0, 63] range");
    }

    Ok(TextElement {
        layer,
        texttype,
        anchor,
        string,
        presentation,
        can_scale: raw_width >= 0,
        width: (raw_width.unsigned_abs() as f64) * dbu_in_um,
        transform: transform_state.into_transform(),
    })
}

fn parse_sref<R: Read>(reader: &mut R, bytes_read: &mut u64, dbu_in_um: f64) -> Result<UnresolvedRef, GdsError> {
    let mut target_name: Option<String> = None;
    let mut xy: Option<Point> = None;
    let mut transform_state = TransformState::default();
    let mut seen_tolerant: Vec<u16> = Vec::new();
    let mut props = PropertyState::default();

    loop {
        let rec = read_record(reader, bytes_read)?.ok_or(GdsError::Io {
            offset: *bytes_read,
            message: "unexpected end of stream inside structure reference".to_string(),
        })?;

        match rec.token {
            token::SNAME => set_once(&mut target_name, rec.as_string(), &rec, "SREF", "SNAME")?,
            token::XY => {
                if xy.is_some() {
                    return Err(duplicate(&rec, "SREF", "XY"));
                }
                xy = decode_xy_pairs(&rec, dbu_in_um).into_iter().next();
            }
            token::STRANS => transform_state.apply_strans(&rec)?,
            token::MAG => transform_state.apply_mag(&rec)?,
            token::ANGLE => transform_state.apply_angle(&rec)?,
            token::PROPATTR => props.apply_attr(&rec)?,
            token::PROPVALUE => props.apply_value(&rec)?,
            token::ENDEL => break,
            t if is_tolerant_skip(t) => warn_tolerant(t, &rec, &mut seen_tolerant)?,
            other => {
                return Err(GdsError::UnexpectedToken {
                    offset: rec.offset,
                    token: other,
                    token_name: describe_token(other),
                    expected: "an SREF sub-record or ENDEL",
                })
            }
        }
    }
    props.finish(*bytes_read, "SREF")?;

    let target_name = target_name.ok_or_else(|| missing(*bytes_read, "SREF", "SNAME"))?;
    let origin = xy.ok_or_else(|| missing(*bytes_read, "SREF", "XY"))?;

    Ok(UnresolvedRef {
        target_name,
        origin,
        transform: transform_state.into_transform(),
    })
}

fn parse_aref<R: Read>(reader: &mut R, bytes_read: &mut u64, dbu_in_um: f64) -> Result<UnresolvedArrayRef, GdsError> {
    let mut target_name: Option<String> = None;
    let mut colrow: Option<(u16, u16)> = None;
    let mut xy: Option<Vec<Point>> = None;
    let mut transform_state = TransformState::default();
    let mut seen_tolerant: Vec<u16> = Vec::new();
    let mut props = PropertyState::default();

    loop {
        let rec = read_record(reader, bytes_read)?.ok_or(GdsError::Io {
            offset: *bytes_read,
            message: "unexpected end of stream inside array reference".to_string(),
        })?;

        match rec.token {
            token::SNAME => set_once(&mut target_name, rec.as_string(), &rec, "AREF", "SNAME")?,
            token::COLROW => {
                if colrow.is_some() {
                    return Err(duplicate(&rec, "AREF", "COLROW"));
                }
                let v = rec.as_i16_vec();
                let cols = v.first().copied().unwrap_or(0);
                let rows = v.get(1).copied().unwrap_or(0);
                if cols.unsigned_abs() as u32 > 32767 || rows.unsigned_abs() as u32 > 32767 {
                    log::warn!("AREF column/row count ({cols}, {rows}) outside the [0, 32767] range");
                }
                colrow = Some((cols as u16, rows as u16));
            }
            token::XY => {
                if xy.is_some() {
                    return Err(duplicate(&rec, "AREF", "XY"));
                }
                xy = Some(decode_xy_pairs(&rec, dbu_in_um));
            }
            token::STRANS => transform_state.apply_strans(&rec)?,
            token::MAG => transform_state.apply_mag(&rec)?,
            token::ANGLE => transform_state.apply_angle(&rec)?,
            token::PROPATTR => props.apply_attr(&rec)?,
            token::PROPVALUE => props.apply_value(&rec)?,
            token::ENDEL => break,
            t if is_tolerant_skip(t) => warn_tolerant(t, &rec, &mut seen_tolerant)?,
            other => {
                return Err(GdsError::UnexpectedToken {
                    offset: rec.offset,
                    token: other,
                    token_name: describe_token(other),
                    expected: "an AREF sub-record or ENDEL",
                })
            }
        }
    }
    props.finish(*bytes_read, "AREF")?;

    let target_name = target_name.ok_or_else(|| missing(*bytes_read, "AREF", "SNAME"))?;
    let (columns, rows) = colrow.ok_or_else(|| missing(*bytes_read, "AREF", "COLROW"))?;
    let points = xy.ok_or_else(|| missing(*bytes_read, "AREF", "XY"))?;
    if points.len() != 3 {
        return Err(missing(*bytes_read, "AREF", "XY (three points)"));
    }
    let origin = points[0];
    let end_of_cols = points[1];
    let end_of_rows = points[2];
    let delta_col = if columns == 0 {
        Point::origin()
    } else {
        Point::new(
            (end_of_cols.x - origin.x) / columns as f64,
            (end_of_cols.y - origin.y) / columns as f64,
        )
    };
    let delta_row = if rows == 0 {
        Point::origin()
    } else {
        Point::new(
            (end_of_rows.x - origin.x) / rows as f64,
            (end_of_rows.y - origin.y) / rows as f64,
        )
    };

    Ok(UnresolvedArrayRef {
        target_name,
        origin,
        transform: transform_state.into_transform(),
        columns,
        rows,
        delta_col,
        delta_row,
    })
}

/// Accumulates STRANS/MAG/ANGLE sub-records into a `Transform`. Absolute
/// magnification/angle bits are decoded but never acted on; every
/// reference's effective transform is relative.
#[derive(Default)]
struct TransformState {
    reflect_x: bool,
    mag: Option<f64>,
    angle: Option<f64>,
    strans_seen: bool,
    mag_seen: bool,
    angle_seen: bool,
}

impl TransformState {
    fn apply_strans(&mut self, rec: &RawRecord) -> Result<(), GdsError> {
        if self.strans_seen {
            return Err(duplicate(rec, "reference", "STRANS"));
        }
        self.strans_seen = true;
        let bits = rec.as_i16_vec();
        let flags = bits.first().copied().unwrap_or(0) as u16;
        self.reflect_x = flags & 0x8000 != 0;
        // Bits 2 (0x0004, absolute magnification) and 1 (0x0002, absolute
        // angle) are decoded here for completeness but intentionally
        // never consulted: every reference is treated as relative.
        Ok(())
    }

    fn apply_mag(&mut self, rec: &RawRecord) -> Result<(), GdsError> {
        if self.mag_seen {
            return Err(duplicate(rec, "reference", "MAG"));
        }
        self.mag_seen = true;
        self.mag = rec.as_f64_vec().first().copied();
        Ok(())
    }

    fn apply_angle(&mut self, rec: &RawRecord) -> Result<(), GdsError> {
        if self.angle_seen {
            return Err(duplicate(rec, "reference", "ANGLE"));
        }
        self.angle_seen = true;
        self.angle = rec.as_f64_vec().first().copied();
        Ok(())
    }

    fn into_transform(self) -> Transform {
        Transform::new(self.reflect_x, self.mag.unwrap_or(1.0), self.angle.unwrap_or(0.0))
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, rec: &RawRecord, element: &'static str, field: &'static str) -> Result<(), GdsError> {
    if slot.is_some() {
        return Err(duplicate(rec, element, field));
    }
    *slot = Some(value);
    Ok(())
}

/// First int16 in a record's payload, or 0 for a malformed/empty one
/// (preferred over panicking on untrusted input; callers that require the
/// field enforce its presence via `set_once`/`missing` instead).
fn first_i16(rec: &RawRecord) -> i16 {
    rec.as_i16_vec().first().copied().unwrap_or(0)
}

fn first_i32(rec: &RawRecord) -> i32 {
    rec.as_i32_vec().first().copied().unwrap_or(0)
}

fn duplicate(rec: &RawRecord, element: &'static str, field: impl Into<String>) -> GdsError {
    GdsError::DuplicateSubRecord {
        offset: rec.offset,
        element,
        token_name: field.into(),
    }
}

fn missing(offset: u64, element: &'static str, field: &'static str) -> GdsError {
    GdsError::MissingSubRecord {
        offset,
        element,
        missing: field,
    }
}

fn warn_tolerant(t: u16, rec: &RawRecord, seen: &mut Vec<u16>) -> Result<(), GdsError> {
    if seen.contains(&t) {
        return Err(duplicate(rec, "element", describe_token(t)));
    }
    seen.push(t);
    log::warn!(
        "unimplemented sub-record {} at offset {} accepted and ignored",
        describe_token(t),
        rec.offset
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_and_empty_lib(structs: &[u8]) -> Vec<u8> {
        let mut buf = vec![0x00, 0x06, 0x00, 0x02, 0x00, 0x06]; // HEADER length 6, version 6
        record::write_i16s(&mut buf, token::BGNLIB, &[0; 12]).unwrap();
        record::write_ascii(&mut buf, token::LIBNAME, "LIB").unwrap();
        record::write_reals_checked(&mut buf, token::UNITS, &[0.001, 1e-9]).unwrap();
        buf.extend_from_slice(structs);
        record::write_empty(&mut buf, token::ENDLIB).unwrap();
        buf
    }

    #[test]
    fn test_read_empty_library() {
        let mut struct_bytes = Vec::new();
        record::write_i16s(&mut struct_bytes, token::BGNSTR, &[0; 12]).unwrap();
        record::write_ascii(&mut struct_bytes, token::STRNAME, "A").unwrap();
        record::write_empty(&mut struct_bytes, token::ENDSTR).unwrap();

        let data = header_and_empty_lib(&struct_bytes);
        let mut cursor = Cursor::new(data);
        let (library, version) = read_library(&mut cursor, &GdsReadOptions::default()).unwrap();
        assert_eq!(version, 6);
        assert_eq!(library.cell_count(), 1);
        let cell = library.cell(library.find_by_name("A").unwrap()).unwrap();
        assert_eq!(cell.elements.len(), 0);
    }

    #[test]
    fn test_undefined_structure_is_fatal() {
        let mut struct_bytes = Vec::new();
        record::write_i16s(&mut struct_bytes, token::BGNSTR, &[0; 12]).unwrap();
        record::write_ascii(&mut struct_bytes, token::STRNAME, "P").unwrap();
        record::write_empty(&mut struct_bytes, token::SREF).unwrap();
        record::write_ascii(&mut struct_bytes, token::SNAME, "MISSING").unwrap();
        record::write_i32s(&mut struct_bytes, token::XY, &[0, 0]).unwrap();
        record::write_empty(&mut struct_bytes, token::ENDEL).unwrap();
        record::write_empty(&mut struct_bytes, token::ENDSTR).unwrap();

        let data = header_and_empty_lib(&struct_bytes);
        let mut cursor = Cursor::new(data);
        let err = read_library(&mut cursor, &GdsReadOptions::default()).unwrap_err();
        assert!(matches!(err, GdsError::UndefinedStructure(_)));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let data = vec![0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00];
        let mut cursor = Cursor::new(data);
        let err = read_library(&mut cursor, &GdsReadOptions::default()).unwrap_err();
        assert!(matches!(err, GdsError::BadMagic { .. }));
    }

    #[test]
    fn test_propattr_propvalue_pair_is_tolerated() {
        let mut struct_bytes = Vec::new();
        record::write_i16s(&mut struct_bytes, token::BGNSTR, &[0; 12]).unwrap();
        record::write_ascii(&mut struct_bytes, token::STRNAME, "A").unwrap();
        record::write_empty(&mut struct_bytes, token::BOUNDARY).unwrap();
        record::write_i16s(&mut struct_bytes, token::LAYER, &[2]).unwrap();
        record::write_i16s(&mut struct_bytes, token::DATATYPE, &[0]).unwrap();
        record::write_i32s(&mut struct_bytes, token::XY, &[0, 0, 1, 0, 1, 1, 0, 0]).unwrap();
        record::write_i16s(&mut struct_bytes, token::PROPATTR, &[1]).unwrap();
        record::write_ascii(&mut struct_bytes, token::PROPVALUE, "note").unwrap();
        record::write_empty(&mut struct_bytes, token::ENDEL).unwrap();
        record::write_empty(&mut struct_bytes, token::ENDSTR).unwrap();

        let data = header_and_empty_lib(&struct_bytes);
        let mut cursor = Cursor::new(data);
        let (library, _) = read_library(&mut cursor, &GdsReadOptions::default()).unwrap();
        let cell = library.cell(library.find_by_name("A").unwrap()).unwrap();
        assert_eq!(cell.boundaries().count(), 1);
    }

    #[test]
    fn test_unpaired_propvalue_is_fatal() {
        let mut struct_bytes = Vec::new();
        record::write_i16s(&mut struct_bytes, token::BGNSTR, &[0; 12]).unwrap();
        record::write_ascii(&mut struct_bytes, token::STRNAME, "A").unwrap();
        record::write_empty(&mut struct_bytes, token::BOUNDARY).unwrap();
        record::write_i16s(&mut struct_bytes, token::LAYER, &[2]).unwrap();
        record::write_i16s(&mut struct_bytes, token::DATATYPE, &[0]).unwrap();
        record::write_i32s(&mut struct_bytes, token::XY, &[0, 0, 1, 0, 1, 1, 0, 0]).unwrap();
        record::write_ascii(&mut struct_bytes, token::PROPVALUE, "note").unwrap();
        record::write_empty(&mut struct_bytes, token::ENDEL).unwrap();
        record::write_empty(&mut struct_bytes, token::ENDSTR).unwrap();

        let data = header_and_empty_lib(&struct_bytes);
        let mut cursor = Cursor::new(data);
        let err = read_library(&mut cursor, &GdsReadOptions::default()).unwrap_err();
        assert!(matches!(err, GdsError::UnexpectedToken { .. }));
    }
}
