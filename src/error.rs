//! Error types for log aggregation.
//!
//! Missing run logs are not errors. Everything listed here stops the run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving, scanning, or averaging run logs.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A matched line did not carry a parseable number after the metric prefix.
    #[error("malformed value in {}:{line}: {text:?}", .path.display())]
    MalformedValue {
        path: PathBuf,
        line: usize,
        text: String,
    },

    /// A position with no samples was reached while averaging.
    #[error("no samples at position {position}; groups disagree on episode count")]
    EmptyBucket { position: usize },

    /// An existing run log could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("no groups given")]
    NoGroups,

    #[error("bucket size must be at least 1")]
    InvalidBucketSize,
}

pub type AggregateResult<T> = std::result::Result<T, AggregateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_value_message() {
        let err = AggregateError::MalformedValue {
            path: PathBuf::from("sarsa/is2013-sarsa-3.txt"),
            line: 12,
            text: "abc".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sarsa/is2013-sarsa-3.txt:12"));
        assert!(msg.contains("\"abc\""));
    }

    #[test]
    fn test_empty_bucket_message() {
        let err = AggregateError::EmptyBucket { position: 4 };
        assert!(err.to_string().contains("position 4"));
    }
}
