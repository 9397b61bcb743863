use thiserror::Error;

/// Error surface for the PngBin codec core.
///
/// One variant per error kind named in the format spec, plus a transparent
/// `Io` escape hatch for failures the underlying sink/source raises that
/// aren't one of the structural cases below.
#[derive(Debug, Error)]
pub enum PngBinError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid PNG structure: {0}")]
    InvalidPng(String),

    #[error("incomplete read: expected {expected} bytes, got {got}")]
    IncompleteRead { expected: usize, got: usize },

    #[error("end of stream: descriptor iterator exhausted")]
    EndOfStream,

    #[error("write after finish/close")]
    AlreadyFinished,

    #[error("range fetch failed: {0}")]
    NetRead(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PngBinError>;

impl PngBinError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_png(msg: impl Into<String>) -> Self {
        Self::InvalidPng(msg.into())
    }

    /// Maps an I/O error from a `read_exact`-style call to `IncompleteRead`
    /// when it's an unexpected-EOF short read, otherwise passes it through
    /// as a plain `Io` error.
    pub(crate) fn from_short_read(err: std::io::Error, expected: usize, got: usize) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::IncompleteRead { expected, got }
        } else {
            Self::Io(err)
        }
    }
}
