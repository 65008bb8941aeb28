//! # gds-io
//!
//! The GDSII binary stream codec: a bit-exact GDS64 float converter, the
//! length-prefixed record primitive, database-unit scale arithmetic, and
//! the reader/writer pair that drive them against a `gds_core::Library`.
//!
//! This is also the sole place in the codec that reads wall-clock time
//! (via [`save`]'s caller-supplied `now`) and the only place a
//! [`Configuration`] gets resolved into concrete header values — the
//! reader and writer themselves stay pure functions of their inputs.

pub mod codec;
pub mod error;
pub mod reader;
pub mod record;
pub mod scale;
pub mod writer;

use std::io::{Read, Write};

use gds_core::{CellId, Library, Timestamp};

pub use error::GdsError;
pub use reader::GdsReadOptions;

/// Configuration for a [`save`] call, mirroring the `name`/`userunit`/
/// `modify`/`acc`/`verbose` knobs an application-level caller expects to
/// set. Defaults match the common GDSII convention: a generic library
/// name, 1 micrometer display unit, and quiet logging.
#[derive(Debug, Clone)]
pub struct GdsWriteOptions {
    pub name: String,
    pub userunit_in_um: f64,
    /// Explicit modification timestamp for the library and every
    /// structure; `None` means the caller wants "now" and must supply it
    /// (this crate never reads the clock itself — see module docs).
    pub modify: Option<Timestamp>,
    pub acc: Option<Timestamp>,
    pub verbose: bool,
}

impl Default for GdsWriteOptions {
    fn default() -> Self {
        Self {
            name: "GDSIILIB".to_string(),
            userunit_in_um: 1.0,
            modify: None,
            acc: None,
            verbose: false,
        }
    }
}

/// Serializes `library`'s cells reachable from `roots` to `sink` as a
/// GDSII stream. `now` substitutes for every modification timestamp
/// (BGNLIB and every BGNSTR); creation timestamps pass through unchanged.
///
/// The database scale is taken from `library.dbu_in_um`; if any cell in
/// the write set — every cell reachable from `roots`, not just the roots
/// themselves — carries a conflicting `preferred_dbs`, the write fails
/// with [`GdsError::ScaleMismatch`].
pub fn save<W: Write>(
    sink: &mut W,
    library: &Library,
    roots: &[CellId],
    options: &GdsWriteOptions,
    now: Timestamp,
) -> Result<(), GdsError> {
    let write_set = writer::dependency_order(library, roots)?;
    let preferences: Vec<Option<f64>> = write_set
        .iter()
        .filter_map(|&id| library.cell(id))
        .map(|c| c.preferred_dbs)
        .collect();
    let resolved_dbu = scale::resolve_common_scale(&preferences).unwrap_or(library.dbu_in_um);
    if (resolved_dbu - library.dbu_in_um).abs() > f64::EPSILON * resolved_dbu.abs().max(1.0) {
        return Err(GdsError::ScaleMismatch {
            a: library.dbu_in_um,
            b: resolved_dbu,
        });
    }

    let modify = options.modify.unwrap_or(now);
    if options.verbose {
        log::info!("writing library '{}' ({} root cells)", options.name, roots.len());
    }

    writer::write_library(sink, library, roots, &options.name, options.userunit_in_um, modify)
}

/// Reads a GDSII stream from `source`, returning the top-level cells (those
/// not reachable as a reference target from any other cell) as a
/// name-to-cell mapping, plus the full library for access to every cell
/// including non-top-level ones.
pub fn load<R: Read>(source: &mut R, options: &GdsReadOptions) -> Result<Library, GdsError> {
    let (library, _version) = reader::read_library(source, options)?;
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_save_then_load_roundtrip() {
        let mut lib = Library::new("ANY", 0.001, 1.0);
        let a = lib.add_cell("A");

        let mut buf = Vec::new();
        save(&mut buf, &lib, &[a], &GdsWriteOptions::default(), Timestamp::epoch()).unwrap();

        let mut cursor = Cursor::new(buf);
        let loaded = load(&mut cursor, &GdsReadOptions::default()).unwrap();
        assert_eq!(loaded.name, "GDSIILIB");
        assert_eq!(loaded.cell_count(), 1);
    }

    #[test]
    fn test_scale_mismatch_rejected() {
        let mut lib = Library::new("ANY", 0.001, 1.0);
        let a = lib.add_cell("A");
        lib.cell_mut(a).unwrap().preferred_dbs = Some(0.0005);

        let mut buf = Vec::new();
        let err = save(&mut buf, &lib, &[a], &GdsWriteOptions::default(), Timestamp::epoch()).unwrap_err();
        assert!(matches!(err, GdsError::ScaleMismatch { .. }));
    }

    #[test]
    fn test_scale_mismatch_from_non_root_child_rejected() {
        // The conflicting preference lives on a cell reached only via an
        // SREF from the root, not on the root itself.
        use gds_core::{Point, StructureRef, Transform};

        let mut lib = Library::new("ANY", 0.001, 1.0);
        let child = lib.add_cell("Child");
        lib.cell_mut(child).unwrap().preferred_dbs = Some(0.0005);
        let root = lib.add_cell("Root");
        lib.cell_mut(root).unwrap().add_sref(StructureRef {
            target: child,
            target_name: "Child".to_string(),
            origin: Point::origin(),
            transform: Transform::default(),
        });

        let mut buf = Vec::new();
        let err = save(&mut buf, &lib, &[root], &GdsWriteOptions::default(), Timestamp::epoch()).unwrap_err();
        assert!(matches!(err, GdsError::ScaleMismatch { .. }));
    }
}
