//! Element-wise comparison of a kernel result against the reference.
//!
//! A mismatch is a measurement, not an error: the report says how many
//! elements agree and the caller decides what to do with it.

use std::fmt;

/// Absolute tolerance the kernel is held to.
pub const TOLERANCE: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyReport {
    /// Elements with `|expected - actual| < tolerance`.
    pub matched: usize,
    pub total: usize,
    /// Largest absolute difference seen (NaN differences are skipped).
    pub max_abs_diff: f32,
}

impl AccuracyReport {
    pub fn mismatched(&self) -> usize {
        self.total - self.matched
    }

    pub fn all_matched(&self) -> bool {
        self.matched == self.total
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.matched as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Num correct: {} / {} ({:.2}% accuracy, max diff {:e})",
            self.matched,
            self.total,
            self.percent(),
            self.max_abs_diff
        )
    }
}

/// Compares `actual` against `expected` element by element.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn compare(expected: &[f32], actual: &[f32], tolerance: f32) -> AccuracyReport {
    assert_eq!(
        expected.len(),
        actual.len(),
        "length mismatch: expected {}, got {}",
        expected.len(),
        actual.len()
    );

    let mut matched = 0;
    let mut max_abs_diff = 0.0f32;
    for (&e, &a) in expected.iter().zip(actual) {
        let diff = (e - a).abs();
        if diff < tolerance {
            matched += 1;
        }
        max_abs_diff = max_abs_diff.max(diff);
    }

    AccuracyReport {
        matched,
        total: expected.len(),
        max_abs_diff,
    }
}
