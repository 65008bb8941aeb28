//! Database-unit scale arithmetic: converting physical lengths (treated as
//! micrometers when unitless, per the rest of this crate's convention) to
//! and from the 32-bit integer grid a GDSII library's database unit defines.

use crate::error::GdsError;

/// Converts a physical length (in micrometers) to an on-disk grid integer
/// at database-unit scale `dbu_in_um`.
pub fn length_to_grid(length_um: f64, dbu_in_um: f64) -> Result<i32, GdsError> {
    let scaled = length_um / dbu_in_um;
    if scaled.abs() >= 2f64.powi(31) {
        return Err(GdsError::Core(gds_core::CoreError::ScaleOutOfRange {
            value: length_um,
            dbs: dbu_in_um,
        }));
    }
    Ok(scaled.round() as i32)
}

/// Converts an on-disk grid integer back to a physical length in micrometers.
pub fn grid_to_length(n: i32, dbu_in_um: f64) -> f64 {
    n as f64 * dbu_in_um
}

/// Common GDSII database-unit quanta, in meters.
pub const ONE_UM_IN_M: f64 = 1e-6;
pub const ONE_NM_IN_M: f64 = 1e-9;
pub const ONE_PM_IN_M: f64 = 1e-12;

const SNAP_TOLERANCE: f64 = 1e-6;

/// A database-unit quantum resolved from a library's UNITS record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DbUnit {
    Micrometer,
    Nanometer,
    Picometer,
    /// No standard quantum matched within tolerance; carries the measured
    /// value in meters verbatim.
    Anonymous(f64),
}

impl DbUnit {
    pub fn in_meters(&self) -> f64 {
        match self {
            DbUnit::Micrometer => ONE_UM_IN_M,
            DbUnit::Nanometer => ONE_NM_IN_M,
            DbUnit::Picometer => ONE_PM_IN_M,
            DbUnit::Anonymous(m) => *m,
        }
    }

    pub fn in_um(&self) -> f64 {
        self.in_meters() / ONE_UM_IN_M
    }

    /// Snaps a measured database-unit-in-meters value to the nearest
    /// standard quantum within floating tolerance, falling back to an
    /// anonymous unit equal to the measured value.
    pub fn snap(measured_in_meters: f64) -> Self {
        let candidates = [
            (ONE_UM_IN_M, DbUnit::Micrometer),
            (ONE_NM_IN_M, DbUnit::Nanometer),
            (ONE_PM_IN_M, DbUnit::Picometer),
        ];
        for (quantum, unit) in candidates {
            if ((measured_in_meters - quantum) / quantum).abs() < SNAP_TOLERANCE {
                return unit;
            }
        }
        DbUnit::Anonymous(measured_in_meters)
    }
}

/// Strips units entirely for a "nounits" read: returns a double whose
/// numeric value equals the length in micrometers.
pub fn to_unitless_micrometers(n: i32, dbu_in_um: f64) -> f64 {
    grid_to_length(n, dbu_in_um)
}

/// Computes the common database scale (in micrometers) for a set of cells,
/// each of which may carry its own preferred scale. Cells with no opinion
/// (`None`) are ignored; disagreement among the ones that do have an
/// opinion is a fatal encode error. Falls back to 1 nm when no cell has a
/// preference.
pub fn resolve_common_scale(preferences: &[Option<f64>]) -> Result<f64, GdsError> {
    const DEFAULT_DBU_IN_UM: f64 = 0.001; // 1 nm

    let mut resolved: Option<f64> = None;
    for &pref in preferences.iter().flatten() {
        match resolved {
            None => resolved = Some(pref),
            Some(existing) if (existing - pref).abs() > f64::EPSILON * existing.abs().max(1.0) => {
                return Err(GdsError::ScaleMismatch { a: existing, b: pref });
            }
            _ => {}
        }
    }
    Ok(resolved.unwrap_or(DEFAULT_DBU_IN_UM))
}
