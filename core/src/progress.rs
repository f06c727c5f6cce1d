//! Batch progress model
//!
//! `ProgressState` is the only data the application layer hands across the
//! bridge. Everything the user sees (status text, progress bar) is derived
//! from it here so both platform adapters render identically.

use serde::{Deserialize, Serialize};

/// How `completed > total` is handled before progress is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Surface the values exactly as the caller sent them
    #[default]
    PassThrough,
    /// Clamp `completed` down to `total`
    Clamp,
}

/// Progress of the running batch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, uniffi::Record,
)]
pub struct ProgressState {
    pub total: u32,
    pub completed: u32,
}

impl ProgressState {
    pub fn new(total: u32, completed: u32) -> Self {
        Self { total, completed }
    }

    /// `completed` ran past `total`
    pub fn is_overflowing(&self) -> bool {
        self.completed > self.total
    }

    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }

    /// Apply the overflow policy, returning the state that will be surfaced
    pub fn normalized(self, policy: OverflowPolicy) -> Self {
        match policy {
            OverflowPolicy::PassThrough => self,
            OverflowPolicy::Clamp => Self {
                total: self.total,
                completed: self.completed.min(self.total),
            },
        }
    }

    /// Progress bar shape for this state
    pub fn indicator(&self) -> ProgressIndicator {
        if self.total == 0 {
            ProgressIndicator::Indeterminate
        } else {
            ProgressIndicator::Determinate {
                max: self.total,
                current: self.completed,
            }
        }
    }

    /// Body text shown in the status surface
    pub fn status_text(&self) -> String {
        format!("Processing {} of {}", self.completed, self.total)
    }
}

impl std::fmt::Display for ProgressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Progress bar rendering handed to the notification host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressIndicator {
    /// Spinner / marquee, no known total
    Indeterminate,
    Determinate { max: u32, current: u32 },
}

impl ProgressIndicator {
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, ProgressIndicator::Indeterminate)
    }

    /// Completed fraction in `[0, 1]`, `None` when indeterminate
    pub fn fraction(&self) -> Option<f64> {
        match *self {
            ProgressIndicator::Indeterminate => None,
            ProgressIndicator::Determinate { max, current } => {
                Some((current as f64 / max as f64).min(1.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(ProgressState::new(10, 3).status_text(), "Processing 3 of 10");
        assert_eq!(ProgressState::new(0, 0).status_text(), "Processing 0 of 0");
    }

    #[test]
    fn test_zero_total_is_indeterminate() {
        let indicator = ProgressState::new(0, 0).indicator();
        assert!(indicator.is_indeterminate());
        assert_eq!(indicator.fraction(), None);
    }

    #[test]
    fn test_determinate_fraction() {
        let indicator = ProgressState::new(10, 4).indicator();
        assert_eq!(
            indicator,
            ProgressIndicator::Determinate { max: 10, current: 4 }
        );
        assert_eq!(indicator.fraction(), Some(0.4));
    }

    #[test]
    fn test_overflow_fraction_is_capped() {
        let state = ProgressState::new(5, 9);
        assert!(state.is_overflowing());
        assert_eq!(state.indicator().fraction(), Some(1.0));
    }

    #[test]
    fn test_pass_through_keeps_overflow() {
        let state = ProgressState::new(5, 9).normalized(OverflowPolicy::PassThrough);
        assert_eq!(state.status_text(), "Processing 9 of 5");
    }

    #[test]
    fn test_clamp_policy() {
        let state = ProgressState::new(5, 9).normalized(OverflowPolicy::Clamp);
        assert_eq!(state, ProgressState::new(5, 5));
        assert!(state.is_finished());

        // Zero total clamps completed to zero as well
        let state = ProgressState::new(0, 3).normalized(OverflowPolicy::Clamp);
        assert_eq!(state, ProgressState::new(0, 0));
    }
}
