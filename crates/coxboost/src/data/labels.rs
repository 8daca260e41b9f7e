use ndarray::{Array1, ArrayView1};

use crate::error::{LabelError, Result, SurvivalError};

// =============================================================================
// SurvivalLabel
// =============================================================================

/// A right-censored survival observation.
///
/// At the boosting-loop boundary this travels as a single signed number
/// (see [`SurvivalLabel::encode`] / [`SurvivalLabel::decode`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurvivalLabel {
    time: f64,
    event: bool,
}

impl SurvivalLabel {
    /// Create a validated label.
    ///
    /// Censoring at time zero is allowed; an event at time zero is not,
    /// because its encoding would read back as censored.
    pub fn new(time: f64, event: bool) -> std::result::Result<Self, LabelError> {
        if !time.is_finite() || time < 0.0 {
            return Err(LabelError::InvalidTime(time));
        }
        if event && time == 0.0 {
            return Err(LabelError::EventAtTimeZero);
        }
        Ok(Self { time, event })
    }

    /// An observed event at `time`.
    pub fn event(time: f64) -> std::result::Result<Self, LabelError> {
        Self::new(time, true)
    }

    /// An observation censored at `time`.
    pub fn censored(time: f64) -> std::result::Result<Self, LabelError> {
        Self::new(time, false)
    }

    /// Decode a sign-encoded label: `> 0` is an event, anything else is censored.
    ///
    /// No validation is applied; a NaN label decodes to a censored
    /// observation with NaN time.
    #[inline]
    pub fn decode(encoded: f64) -> Self {
        Self {
            time: encoded.abs(),
            event: encoded > 0.0,
        }
    }

    /// Sign-encode this label: `+time` for events, `-time` for censored.
    #[inline]
    pub fn encode(self) -> f64 {
        if self.event { self.time } else { -self.time }
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Whether the event was observed (not censored).
    #[inline]
    pub fn is_event(&self) -> bool {
        self.event
    }
}

/// Split sign-encoded labels into `(events, times)` in input order.
pub fn split_labels(encoded: ArrayView1<'_, f64>) -> (Vec<bool>, Vec<f64>) {
    encoded
        .iter()
        .map(|&y| {
            let label = SurvivalLabel::decode(y);
            (label.is_event(), label.time())
        })
        .unzip()
}

// =============================================================================
// LabelSource
// =============================================================================

/// Read-only access to sign-encoded survival labels.
///
/// This is the "get labels" handle a boosting runtime hands to objective
/// and metric callbacks. Implementors only expose a view; nothing in this
/// crate mutates labels.
pub trait LabelSource {
    fn labels(&self) -> ArrayView1<'_, f64>;
}

impl LabelSource for Array1<f64> {
    fn labels(&self) -> ArrayView1<'_, f64> {
        self.view()
    }
}

impl LabelSource for ArrayView1<'_, f64> {
    fn labels(&self) -> ArrayView1<'_, f64> {
        self.view()
    }
}

impl LabelSource for Vec<f64> {
    fn labels(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(self.as_slice())
    }
}

// =============================================================================
// SurvivalTargets
// =============================================================================

/// Owned sign-encoded survival labels for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalTargets {
    encoded: Array1<f64>,
}

impl SurvivalTargets {
    /// Wrap already sign-encoded labels.
    pub fn new(encoded: Array1<f64>) -> Self {
        Self { encoded }
    }

    /// Encode explicit labels.
    pub fn from_labels(labels: &[SurvivalLabel]) -> Self {
        Self {
            encoded: labels.iter().map(|l| l.encode()).collect(),
        }
    }

    /// Build from parallel `times` / `events` columns, validating each pair.
    pub fn from_times_events(times: &[f64], events: &[bool]) -> Result<Self> {
        crate::error::check_len("events", times.len(), events.len())?;
        let encoded = times
            .iter()
            .zip(events)
            .enumerate()
            .map(|(index, (&time, &event))| {
                SurvivalLabel::new(time, event)
                    .map(SurvivalLabel::encode)
                    .map_err(|source| SurvivalError::Label { index, source })
            })
            .collect::<Result<Array1<f64>>>()?;
        Ok(Self { encoded })
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.encoded.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }

    /// Number of observed (uncensored) events.
    pub fn n_events(&self) -> usize {
        self.encoded.iter().filter(|&&y| y > 0.0).count()
    }

    pub fn get(&self, index: usize) -> Option<SurvivalLabel> {
        self.encoded.get(index).copied().map(SurvivalLabel::decode)
    }

    pub fn iter(&self) -> impl Iterator<Item = SurvivalLabel> + '_ {
        self.encoded.iter().copied().map(SurvivalLabel::decode)
    }

    pub fn events(&self) -> Vec<bool> {
        self.iter().map(|l| l.is_event()).collect()
    }

    pub fn times(&self) -> Vec<f64> {
        self.iter().map(|l| l.time()).collect()
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.encoded.view()
    }
}

impl LabelSource for SurvivalTargets {
    fn labels(&self) -> ArrayView1<'_, f64> {
        self.encoded.view()
    }
}

impl From<Vec<f64>> for SurvivalTargets {
    fn from(encoded: Vec<f64>) -> Self {
        Self::new(Array1::from(encoded))
    }
}
