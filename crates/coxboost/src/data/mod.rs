//! Survival label handling.
//!
//! - [`SurvivalLabel`]: explicit `{time, event}` pair
//! - [`SurvivalTargets`]: owned vector of sign-encoded labels
//! - [`LabelSource`]: read-only accessor the objective and metrics consume
//!
//! Feature tables never enter this crate; the boosting loop owns them.

mod labels;

pub use labels::{LabelSource, SurvivalLabel, SurvivalTargets, split_labels};
