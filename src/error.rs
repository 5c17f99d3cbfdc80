use std::fmt;
use std::io;

/// The error taxonomy for this tool. Every fallible operation in the crate
/// returns one of these instead of a raw `std::io::Error` or a panic.
#[derive(Debug)]
pub enum FilterError {
    /// Arguments missing or ill-formed (pre-flight, before any file I/O).
    Usage(String),
    /// File open/read/write failure.
    Io(io::Error),
    /// Required header key absent or malformed in the input file.
    BadHeader(String),
    /// Fewer numeric tokens in the body than `nrows * ncols`.
    TruncatedBody { expected: usize, found: usize },
    /// Input dimensions exceed the implementation's declared maximum.
    GridTooLarge { rows: usize, columns: usize, max_cells: usize },
    /// Radius not positive, or larger than the supported mask.
    InvalidRadius(String),
    /// Unrecognized aggregate function code.
    InvalidAggregate(String),
    /// Grid too small for the requested radius: the processed interior is empty.
    GridTooSmall { edge_guard: usize, rows: usize, columns: usize },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::Usage(msg) => write!(f, "usage error: {}", msg),
            FilterError::Io(e) => write!(f, "I/O error: {}", e),
            FilterError::BadHeader(msg) => write!(f, "bad header: {}", msg),
            FilterError::TruncatedBody { expected, found } => write!(
                f,
                "truncated body: expected {} numeric values but found {}",
                expected, found
            ),
            FilterError::GridTooLarge { rows, columns, max_cells } => write!(
                f,
                "grid too large: {} x {} exceeds the maximum of {} cells",
                rows, columns, max_cells
            ),
            FilterError::InvalidRadius(msg) => write!(f, "invalid radius: {}", msg),
            FilterError::InvalidAggregate(code) => {
                write!(f, "invalid aggregate function code: '{}'", code)
            }
            FilterError::GridTooSmall { edge_guard, rows, columns } => write!(
                f,
                "grid too small: a {}-cell edge guard leaves no interior in a {} x {} grid",
                edge_guard, rows, columns
            ),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilterError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FilterError {
    fn from(e: io::Error) -> FilterError {
        FilterError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
