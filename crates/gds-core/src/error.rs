use thiserror::Error;

/// Errors raised by the in-memory cell-graph collaborator model.
///
/// File-format codec errors (malformed records, unresolved references on
/// read) live in `gds-io::error::GdsError`; this enum is for invariants
/// the model itself enforces regardless of how it was populated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("length {value} does not fit in the database-unit grid at scale {dbs} (|value/dbs| must be < 2^31)")]
    ScaleOutOfRange { value: f64, dbs: f64 },

    #[error("non-finite value {0} cannot be represented in a GDS64 real")]
    NonFinite(f64),

    #[error("cell name '{0}' exceeds the 32-character GDSII name limit")]
    NameTooLong(String),

    #[error("duplicate cell id requested for name '{0}'")]
    DuplicateCellId(String),
}
