//! Error types for the demultiplexing pipeline.

use thiserror::Error;

/// Result type alias for demux operations
pub type Result<T> = std::result::Result<T, DemuxError>;

#[derive(Error, Debug)]
pub enum DemuxError {
    /// Alignment file failed the shape check on its first line
    #[error("Invalid alignment file '{path}': {reason}")]
    MalformedInput { path: String, reason: String },

    /// cs string that does not follow the cs operation grammar
    #[error("Invalid cs string '{cs}': {reason}")]
    InvalidCs { cs: String, reason: String },

    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("Invalid FASTQ record '{id}': {reason}")]
    InvalidFastq { id: String, reason: String },

    /// Interval that cannot be sliced out of its read
    #[error("Interval {label} [{start}, {end}) does not fit read '{read_id}' of length {read_len}")]
    InvalidInterval {
        read_id: String,
        label: String,
        start: i64,
        end: i64,
        read_len: usize,
    },

    /// Decompression, compression or pipe failure while streaming reads
    #[error("{stage} stream failed: {source}")]
    Stream {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse FASTQ: {0}")]
    Fastq(#[from] seq_io::fastq::Error),

    #[error("Failed to read tabular file: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DemuxError {
    pub fn malformed(path: &str, reason: impl Into<String>) -> Self {
        DemuxError::MalformedInput {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn stream(stage: &'static str, source: std::io::Error) -> Self {
        DemuxError::Stream { stage, source }
    }

    /// Fatal errors abort the run, the rest are recovered where they occur
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DemuxError::InvalidCs { .. } | DemuxError::InvalidInterval { .. }
        )
    }
}
