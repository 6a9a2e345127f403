// This module defines the error types for layout-metrics using the thiserror crate.
// MetricsError covers the recoverable failures of the crate: malformed layout IR text
// (with the offending line number), duplicate or unknown function/block names, invalid
// cache-model configuration, and I/O failures when the command-line tool reads its input.
// Precondition violations inside the metric computations (a block missing from the
// address table, a dangling successor) are not represented here; they are programming
// errors upstream and panic. MetricsResult<T> is the convenience alias used throughout.

//! Error types for layout-metrics.

use thiserror::Error;

/// Main error type for parsing inputs and configuring the estimators.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("line {line}: {reason}")]
    Parse {
        line: usize,
        reason: String,
    },

    #[error("line {line}: duplicate {kind} '{name}'")]
    Duplicate {
        line: usize,
        kind: &'static str,
        name: String,
    },

    #[error("line {line}: unknown block '^{name}' in function '{func}'")]
    UnknownBlock {
        line: usize,
        func: String,
        name: String,
    },

    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MetricsError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        MetricsError::Parse {
            line,
            reason: reason.into(),
        }
    }
}

/// Result type alias for layout-metrics operations.
pub type MetricsResult<T> = Result<T, MetricsError>;
