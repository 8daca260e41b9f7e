//! Error types.
//!
//! Every computation in this crate is a deterministic function of its
//! inputs, so errors describe malformed input rather than transient
//! failures. Nothing here is worth retrying.

/// Errors raised while computing objectives and metrics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurvivalError {
    /// Two inputs that must be aligned per sample have different lengths.
    #[error("{what} has length {actual}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A risk score is NaN or infinite.
    #[error("score at index {index} is not finite: {value}")]
    NonFiniteScore { index: usize, value: f64 },

    /// A survival label could not be encoded.
    #[error("label at index {index}: {source}")]
    Label {
        index: usize,
        #[source]
        source: LabelError,
    },

    /// Concordance is undefined when no sample has an observed event.
    #[error("all samples are censored")]
    AllCensored,

    /// Concordance is undefined without at least one comparable pair.
    #[error("data has no comparable pairs, cannot estimate concordance index")]
    NoComparablePairs,
}

/// Errors raised when building a [`crate::SurvivalLabel`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum LabelError {
    #[error("time must be finite and non-negative, got {0}")]
    InvalidTime(f64),

    /// `+0.0` decodes as censored, so an event at time zero has no encoding.
    #[error("an observed event cannot occur at time zero")]
    EventAtTimeZero,
}

/// Errors raised when validating a configuration at build time.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tied_tol must be finite and >= 0, got {0}")]
    InvalidTiedTolerance(f64),
}

/// Result alias for fallible computations in this crate.
pub type Result<T> = std::result::Result<T, SurvivalError>;

/// Check that `actual` matches `expected`, naming the offending input.
#[inline]
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SurvivalError::ShapeMismatch {
            what,
            expected,
            actual,
        })
    }
}
