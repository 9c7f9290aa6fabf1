//! Error types for the paginar library.

use thiserror::Error;

use crate::mem::MAX_FRAMES;

/// Result type alias for simulator operations.
pub type Result<T> = std::result::Result<T, PaginarError>;

/// Library error types.
#[derive(Error, Debug)]
pub enum PaginarError {
    /// IO error while reading an input or random file, or writing the trace
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input file
    #[error("input line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Random file token that is not a signed integer
    #[error("random file: invalid value '{0}'")]
    InvalidRandomValue(String),

    /// Random file with no usable values after the count
    #[error("random file: empty value stream")]
    EmptyRandomStream,

    /// Unrecognized replacement-algorithm letter
    #[error("unknown replacement algorithm '{0}'")]
    UnknownAlgorithm(String),

    /// Frame count outside the supported range
    #[error("frame count {0} outside 1..={MAX_FRAMES}")]
    InvalidFrameCount(usize),

    /// VMA range outside the virtual address space
    #[error("vma {start}..={end} outside the virtual page range")]
    InvalidVma { start: usize, end: usize },

    /// Instruction names a process that was never declared
    #[error("instruction references undeclared process {0}")]
    NoSuchProcess(i64),

    /// Memory access before any context switch
    #[error("memory access with no current process")]
    NoCurrentProcess,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_carries_line() {
        let err = PaginarError::Parse {
            line: 7,
            message: "expected integer".to_string(),
        };
        assert_eq!(err.to_string(), "input line 7: expected integer");
    }

    #[test]
    fn test_unknown_algorithm_display() {
        let err = PaginarError::UnknownAlgorithm("z".to_string());
        assert_eq!(err.to_string(), "unknown replacement algorithm 'z'");
    }

    #[test]
    fn test_invalid_frame_count_display() {
        let err = PaginarError::InvalidFrameCount(129);
        assert_eq!(err.to_string(), "frame count 129 outside 1..=128");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PaginarError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }
}
