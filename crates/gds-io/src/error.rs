use thiserror::Error;

/// Errors raised by the GDSII binary codec: malformed records on read,
/// and encode-time invariant violations on write.
///
/// Every variant carries the context needed to locate the offending
/// record (byte offset, token, enclosing element) per §7.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GdsError {
    #[error("I/O error at offset {offset}: {message}")]
    Io { offset: u64, message: String },

    #[error("malformed record at offset {offset}: length field {declared} implies a negative payload")]
    NegativeLength { offset: u64, declared: u16 },

    #[error("record at offset {offset} (token {token:#06X} {token_name}) has wrong data type for its payload")]
    WrongDataType {
        offset: u64,
        token: u16,
        token_name: String,
    },

    #[error("record payload of {len} bytes exceeds the 0xFFFF on-disk record length limit")]
    RecordTooLarge { len: usize },

    #[error("bad magic bytes at file start: expected 00 06 00 02, found {found:?}")]
    BadMagic { found: Vec<u8> },

    #[error("unexpected record {token:#06X} ({token_name}) at offset {offset}, expected {expected}")]
    UnexpectedToken {
        offset: u64,
        token: u16,
        token_name: String,
        expected: &'static str,
    },

    #[error("duplicate sub-record {token_name} within {element} starting at offset {offset}")]
    DuplicateSubRecord {
        offset: u64,
        element: &'static str,
        token_name: String,
    },

    #[error("{element} at offset {offset} is missing required sub-record {missing}")]
    MissingSubRecord {
        offset: u64,
        element: &'static str,
        missing: &'static str,
    },

    #[error("non-finite value {0} cannot be encoded as a GDS64 real")]
    NonFiniteFloat(f64),

    #[error("structure '{0}' is referenced but not defined in this library")]
    UndefinedStructure(String),

    #[error("dependency cycle detected among structures while computing write order: {0}")]
    DependencyCycle(String),

    #[error("cells disagree on database scale: {a} vs {b}")]
    ScaleMismatch { a: f64, b: f64 },

    #[error(transparent)]
    Core(#[from] gds_core::CoreError),
}
