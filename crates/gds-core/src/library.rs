use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellId, Timestamp};
use crate::error::CoreError;

/// Maximum length of a library or structure name, per the GDSII spec.
pub const MAX_NAME_LEN: usize = 32;

/// The top-level GDSII document: a `CellId`-indexed arena of cells plus a
/// case-insensitive name index, matching `uniquify::Names`' collision
/// semantics but keyed by the first-writer-wins rule §4.4 specifies rather
/// than by renaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    /// Physical length of one on-disk database-unit grid step.
    pub dbu_in_um: f64,
    /// Physical length of one user-unit (a display-scale recommendation).
    pub user_unit_in_um: f64,
    pub created: Timestamp,
    pub accessed: Timestamp,
    cells: Vec<Cell>,
    /// Lowercased name -> index into `cells`, for O(1) lookup and
    /// case-insensitive duplicate detection.
    name_index: HashMap<String, usize>,
}

impl Library {
    pub fn new(name: impl Into<String>, dbu_in_um: f64, user_unit_in_um: f64) -> Self {
        Self {
            name: name.into(),
            dbu_in_um,
            user_unit_in_um,
            created: Timestamp::epoch(),
            accessed: Timestamp::epoch(),
            cells: Vec::new(),
            name_index: HashMap::new(),
        }
    }

    /// Allocates a new, empty, named cell and returns its id.
    ///
    /// Does not itself perform duplicate-name detection: both the writer
    /// (warn-and-continue) and reader (index-on-BGNSTR-return) apply their
    /// own collision policy before calling this.
    pub fn add_cell(&mut self, name: impl Into<String>) -> CellId {
        let id = CellId(self.cells.len());
        let name = name.into();
        let key = name.to_lowercase();
        if let Some(&existing) = self.name_index.get(&key) {
            log::warn!(
                "cell name '{}' collides case-insensitively with existing cell id {}; index now points at the new cell",
                name, existing
            );
        }
        self.name_index.insert(key, id.0);
        self.cells.push(Cell::new(id, name));
        id
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id.0)
    }

    /// Case-insensitive lookup by name, per the library-wide uniqueness invariant.
    pub fn find_by_name(&self, name: &str) -> Option<CellId> {
        self.name_index.get(&name.to_lowercase()).map(|&i| CellId(i))
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cells not referenced (via SREF or AREF) by any other cell in the library.
    pub fn top_level_cells(&self) -> Vec<CellId> {
        let mut referenced = vec![false; self.cells.len()];
        for cell in &self.cells {
            for sref in &cell.srefs {
                referenced[sref.target.0] = true;
            }
            for aref in &cell.arefs {
                referenced[aref.target.0] = true;
            }
        }
        self.cells
            .iter()
            .enumerate()
            .filter(|(i, _)| !referenced[*i])
            .map(|(i, _)| CellId(i))
            .collect()
    }

    /// Validates the library/cell name-length invariant; the caller decides
    /// whether this is a warning (writer) or is ignored (reader, which
    /// tolerates oversized names per §7 category 1).
    pub fn check_name_length(name: &str) -> Result<(), CoreError> {
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::NameTooLong(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_find_cell() {
        let mut lib = Library::new("TESTLIB", 0.001, 1.0);
        let id = lib.add_cell("Foo");
        assert_eq!(lib.find_by_name("foo"), Some(id));
        assert_eq!(lib.find_by_name("FOO"), Some(id));
    }

    #[test]
    fn test_top_level_cells_excludes_referenced() {
        use crate::element::StructureRef;
        use crate::point::Point;
        use crate::transform::Transform;

        let mut lib = Library::new("TESTLIB", 0.001, 1.0);
        let child = lib.add_cell("Child");
        let parent = lib.add_cell("Parent");
        lib.cell_mut(parent).unwrap().add_sref(StructureRef {
            target: child,
            target_name: "Child".to_string(),
            origin: Point::origin(),
            transform: Transform::default(),
        });

        let top = lib.top_level_cells();
        assert_eq!(top, vec![parent]);
    }

    #[test]
    fn test_name_length_check() {
        assert!(Library::check_name_length("short").is_ok());
        let long_name = "x".repeat(33);
        assert!(Library::check_name_length(&long_name).is_err());
    }
}
