use serde::{Deserialize, Serialize};

use crate::element::{ArrayRef, Boundary, Element, StructureRef, TextElement};

/// An arena index into a `Library`'s cell vector.
///
/// Chosen over an owning pointer or a process-wide UUID per the
/// "arena-with-indices" design note: cells reference each other, so an
/// owning-pointer design would require cycles in the type itself, and a
/// UUID buys global uniqueness this crate never needs (one arena per
/// `Library`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellId(pub usize);

/// A creation/modification timestamp pair, Y/M/D/h/m/s each, matching the
/// GDSII BGNLIB/BGNSTR date-array granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub year: i16,
    pub month: i16,
    pub day: i16,
    pub hour: i16,
    pub minute: i16,
    pub second: i16,
}

impl Timestamp {
    pub fn new(year: i16, month: i16, day: i16, hour: i16, minute: i16, second: i16) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub const fn epoch() -> Self {
        Self {
            year: 1970,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

/// A named container of geometry, text, and references — GDSII's "structure".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub name: String,
    pub created: Timestamp,
    pub modified: Timestamp,
    pub elements: Vec<Element>,
    pub srefs: Vec<StructureRef>,
    pub arefs: Vec<ArrayRef>,
    /// This cell's preferred database scale (physical length of one
    /// on-disk grid unit), if it has an opinion; `None` defers to the
    /// library/orchestration default.
    pub preferred_dbs: Option<f64>,
}

impl Cell {
    pub fn new(id: CellId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            created: Timestamp::epoch(),
            modified: Timestamp::epoch(),
            elements: Vec::new(),
            srefs: Vec::new(),
            arefs: Vec::new(),
            preferred_dbs: None,
        }
    }

    pub fn add_boundary(&mut self, boundary: Boundary) {
        self.elements.push(Element::Boundary(boundary));
    }

    pub fn add_text(&mut self, text: TextElement) {
        self.elements.push(Element::Text(text));
    }

    pub fn add_sref(&mut self, sref: StructureRef) {
        self.srefs.push(sref);
    }

    pub fn add_aref(&mut self, aref: ArrayRef) {
        self.arefs.push(aref);
    }

    pub fn boundaries(&self) -> impl Iterator<Item = &Boundary> {
        self.elements.iter().filter_map(|e| match e {
            Element::Boundary(b) => Some(b),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(t) => Some(t),
            _ => None,
        })
    }

    /// Names of every cell this cell instantiates directly (via SREF or AREF).
    pub fn referenced_names(&self) -> Vec<&str> {
        self.srefs
            .iter()
            .map(|s| s.target_name.as_str())
            .chain(self.arefs.iter().map(|a| a.target_name.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_empty() {
        let cell = Cell::new(CellId(0), "A");
        assert_eq!(cell.elements.len(), 0);
        assert_eq!(cell.srefs.len(), 0);
        assert_eq!(cell.arefs.len(), 0);
    }

    #[test]
    fn test_add_boundary() {
        let mut cell = Cell::new(CellId(0), "A");
        cell.add_boundary(Boundary::new(2, 0, vec![]));
        assert_eq!(cell.boundaries().count(), 1);
    }
}
