use serde::{Deserialize, Serialize};

/// A GDSII (layer, datatype-or-texttype) pair.
///
/// Valid layer/datatype numbers lie in `[0, 63]`; callers may construct
/// out-of-range specs (the codec warns rather than refuses, per spec),
/// so this type does not itself enforce the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerSpec {
    pub layer: u16,
    pub xtype: u16,
}

impl LayerSpec {
    pub fn new(layer: u16, xtype: u16) -> Self {
        Self { layer, xtype }
    }

    /// Whether both numbers fall within the spec-mandated `[0, 63]` range.
    pub fn in_range(&self) -> bool {
        self.layer <= 63 && self.xtype <= 63
    }
}

/// An object with a corresponding GDS layer spec (boundary layer/datatype,
/// text layer/texttype).
pub trait HasLayer {
    fn layerspec(&self) -> LayerSpec;
}
