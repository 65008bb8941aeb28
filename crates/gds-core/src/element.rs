use serde::{Deserialize, Serialize};

use crate::cell::CellId;
use crate::layer::{HasLayer, LayerSpec};
use crate::point::Point;
use crate::presentation::Presentation;
use crate::transform::Transform;

/// A closed polygon: a (layer, datatype) pair plus at least 3 distinct
/// vertices. The on-disk closing vertex (a repeat of the first) is an
/// encoding detail handled by `gds-io` and is not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub layer: u16,
    pub datatype: u16,
    pub vertices: Vec<Point>,
}

impl Boundary {
    pub fn new(layer: u16, datatype: u16, vertices: Vec<Point>) -> Self {
        Self {
            layer,
            datatype,
            vertices,
        }
    }
}

impl HasLayer for Boundary {
    fn layerspec(&self) -> LayerSpec {
        LayerSpec::new(self.layer, self.datatype)
    }
}

/// A text label: anchor point, alignment, scale behavior, and string payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub layer: u16,
    pub texttype: u16,
    pub anchor: Point,
    pub string: String,
    pub presentation: Presentation,
    /// Whether the text scales with its enclosing transform (positive WIDTH
    /// on disk) or stays fixed (negative WIDTH on disk).
    pub can_scale: bool,
    /// Absolute value of the on-disk WIDTH, in micrometers.
    pub width: f64,
    pub transform: Transform,
}

impl HasLayer for TextElement {
    fn layerspec(&self) -> LayerSpec {
        LayerSpec::new(self.layer, self.texttype)
    }
}

/// A reference stub as read directly off the wire: the target cell is
/// known only by name until the reference-resolution pass runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedRef {
    pub target_name: String,
    pub origin: Point,
    pub transform: Transform,
}

/// A 2D tiling of a referenced cell, read directly off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedArrayRef {
    pub target_name: String,
    pub origin: Point,
    pub transform: Transform,
    pub columns: u16,
    pub rows: u16,
    pub delta_col: Point,
    pub delta_row: Point,
}

/// A single structure reference (SREF) resolved against a `Library`'s cell arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRef {
    pub target: CellId,
    pub target_name: String,
    pub origin: Point,
    pub transform: Transform,
}

/// A rectangular array reference (AREF) resolved against a `Library`'s cell arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayRef {
    pub target: CellId,
    pub target_name: String,
    pub origin: Point,
    pub transform: Transform,
    pub columns: u16,
    pub rows: u16,
    pub delta_col: Point,
    pub delta_row: Point,
}

impl ArrayRef {
    /// Whether columns/rows fall within the spec-mandated `[0, 32767]` range.
    pub fn counts_in_range(&self) -> bool {
        self.columns <= 32767 && self.rows <= 32767
    }
}

/// A geometric element or text label owned directly by a cell (as opposed
/// to a reference, which is modeled separately since it participates in
/// two-pass resolution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Boundary(Boundary),
    Text(TextElement),
}
