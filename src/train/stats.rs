use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::loss::MseLoss;

/// Accuracy thresholds on `|expected − output|`.
pub const THRESHOLD_LOW: f32 = 0.30;
pub const THRESHOLD_MEDIUM: f32 = 0.20;
pub const THRESHOLD_HIGH: f32 = 0.10;

const CLASS_TOLERANCE: f32 = 1e-6;

/// Outcome of testing one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub epoch: usize,
    /// 1-based line number in the dataset.
    pub line: usize,
    pub expected: Vec<f32>,
    pub output: Vec<f32>,
}

impl TestResult {
    /// True when every output is strictly closer than `threshold` to its target.
    pub fn within(&self, threshold: f32) -> bool {
        !self.expected.is_empty()
            && self.expected.len() == self.output.len()
            && self
                .expected
                .iter()
                .zip(&self.output)
                .all(|(e, o)| (e - o).abs() < threshold)
    }
}

/// Values of the monitored output for one test line, one per epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineProgress {
    pub expected: f32,
    pub values: Vec<f32>,
}

impl LineProgress {
    /// Whether the monitored output moved toward its expected class.
    /// `None` when there are fewer than two points or the target is neither 0 nor 1.
    pub fn converges(&self) -> Option<bool> {
        if self.values.len() < 2 {
            return None;
        }
        let first = self.values[0];
        let last = self.values[self.values.len() - 1];
        if (self.expected - 1.0).abs() < CLASS_TOLERANCE {
            Some(last > first)
        } else if self.expected.abs() < CLASS_TOLERANCE {
            Some(last < first)
        } else {
            None
        }
    }
}

/// Accumulated test results of a run, plus per-line progress in monitored mode.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestReport {
    pub results: Vec<TestResult>,
    /// Keyed by line number; only filled when an output is monitored.
    pub progress: BTreeMap<usize, LineProgress>,
    pub monitored_output: Option<usize>,
}

impl TestReport {
    pub fn new(monitored_output: Option<usize>) -> TestReport {
        TestReport {
            results: Vec::new(),
            progress: BTreeMap::new(),
            monitored_output,
        }
    }

    pub fn record(&mut self, result: TestResult) {
        if let Some(index) = self.monitored_output {
            if let (Some(&value), Some(&expected)) = (result.output.get(index), result.expected.get(index)) {
                let entry = self.progress.entry(result.line).or_insert_with(|| LineProgress {
                    expected,
                    values: Vec::new(),
                });
                entry.expected = expected;
                entry.values.push(value);
            }
        }
        self.results.push(result);
    }

    pub fn last_epoch(&self) -> Option<usize> {
        self.results.iter().map(|r| r.epoch).max()
    }

    /// Recomputes the statistics: accuracy over the most recent epoch tested,
    /// convergence over every recorded epoch.
    pub fn stat(&self) -> Stat {
        let latest = self.last_epoch();
        let results: Vec<&TestResult> = self
            .results
            .iter()
            .filter(|r| Some(r.epoch) == latest)
            .collect();
        let convergence = self.monitored_output.map(|_| Convergence::from_progress(&self.progress));
        Stat::from_results(&results, convergence)
    }
}

/// Convergence counts over monitored lines with at least two progress points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Convergence {
    pub samples: usize,
    pub good: usize,
    pub zero_samples: usize,
    pub good_zero: usize,
    pub one_samples: usize,
    pub good_one: usize,
}

impl Convergence {
    pub fn from_progress(progress: &BTreeMap<usize, LineProgress>) -> Convergence {
        let mut c = Convergence::default();
        for p in progress.values() {
            let Some(good) = p.converges() else { continue };
            c.samples += 1;
            c.good += good as usize;
            if p.expected.abs() < CLASS_TOLERANCE {
                c.zero_samples += 1;
                c.good_zero += good as usize;
            } else {
                c.one_samples += 1;
                c.good_one += good as usize;
            }
        }
        c
    }

    pub fn good_percent(&self) -> f32 {
        percent(self.good, self.samples)
    }

    pub fn good_zero_percent(&self) -> f32 {
        percent(self.good_zero, self.zero_samples)
    }

    pub fn good_one_percent(&self) -> f32 {
        percent(self.good_one, self.one_samples)
    }
}

/// Snapshot of accuracy and convergence for a set of test results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stat {
    pub total_samples: usize,
    pub correct_low: usize,
    pub correct: usize,
    pub correct_high: usize,
    /// Percentage within [`THRESHOLD_LOW`].
    pub accuracy_low: f32,
    /// Percentage within [`THRESHOLD_MEDIUM`]; the headline accuracy.
    pub accuracy: f32,
    /// Percentage within [`THRESHOLD_HIGH`].
    pub accuracy_high: f32,
    pub mean_squared_error: f32,
    pub convergence: Option<Convergence>,
}

impl Stat {
    pub fn from_results(results: &[&TestResult], convergence: Option<Convergence>) -> Stat {
        let total = results.len();
        let count = |threshold: f32| results.iter().filter(|r| r.within(threshold)).count();
        let correct_low = count(THRESHOLD_LOW);
        let correct = count(THRESHOLD_MEDIUM);
        let correct_high = count(THRESHOLD_HIGH);
        let mean_squared_error = if total == 0 {
            0.0
        } else {
            results
                .iter()
                .map(|r| MseLoss::loss(&r.output, &r.expected))
                .sum::<f32>()
                / total as f32
        };

        Stat {
            total_samples: total,
            correct_low,
            correct,
            correct_high,
            accuracy_low: percent(correct_low, total),
            accuracy: percent(correct, total),
            accuracy_high: percent(correct_high, total),
            mean_squared_error,
            convergence,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples tested      : {}", self.total_samples)?;
        writeln!(f, "Accuracy (<{:.2})    : {:.2}% ({})", THRESHOLD_MEDIUM, self.accuracy, self.correct)?;
        writeln!(f, "Low accuracy (<{:.2}): {:.2}% ({})", THRESHOLD_LOW, self.accuracy_low, self.correct_low)?;
        writeln!(f, "High accuracy (<{:.2}): {:.2}% ({})", THRESHOLD_HIGH, self.accuracy_high, self.correct_high)?;
        write!(f, "Mean squared error  : {:.6}", self.mean_squared_error)?;
        if let Some(c) = &self.convergence {
            writeln!(f)?;
            writeln!(f, "Good convergence    : {:.2}% ({}/{})", c.good_percent(), c.good, c.samples)?;
            writeln!(f, "  toward zero       : {:.2}% ({}/{})", c.good_zero_percent(), c.good_zero, c.zero_samples)?;
            write!(f, "  toward one        : {:.2}% ({}/{})", c.good_one_percent(), c.good_one, c.one_samples)?;
        }
        Ok(())
    }
}

fn percent(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 * 100.0 / total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn result(epoch: usize, line: usize, expected: f32, output: f32) -> TestResult {
        TestResult { epoch, line, expected: vec![expected], output: vec![output] }
    }

    fn progress(expected: f32, values: &[f32]) -> LineProgress {
        LineProgress { expected, values: values.to_vec() }
    }

    #[test]
    fn convergence_examples() {
        assert_eq!(progress(1.0, &[0.2, 0.5, 0.8]).converges(), Some(true));
        assert_eq!(progress(0.0, &[0.8, 0.5, 0.2]).converges(), Some(true));
        assert_eq!(progress(1.0, &[0.5, 0.4]).converges(), Some(false));
        assert_eq!(progress(1.0, &[0.5]).converges(), None);
    }

    #[test]
    fn accuracy_at_three_thresholds() {
        let results = [
            result(1, 1, 1.0, 0.95), // all three
            result(1, 2, 1.0, 0.85), // low + medium
            result(1, 3, 0.0, 0.25), // low only
            result(1, 4, 0.0, 0.60), // none
        ];
        let refs: Vec<&TestResult> = results.iter().collect();
        let stat = Stat::from_results(&refs, None);
        assert_eq!(stat.total_samples, 4);
        assert_eq!((stat.correct_low, stat.correct, stat.correct_high), (3, 2, 1));
        assert_abs_diff_eq!(stat.accuracy_low, 75.0);
        assert_abs_diff_eq!(stat.accuracy, 50.0);
        assert_abs_diff_eq!(stat.accuracy_high, 25.0);
    }

    #[test]
    fn monitored_report_tracks_progress_per_line() {
        let mut report = TestReport::new(Some(0));
        for (epoch, (a, b)) in [(0.2, 0.8), (0.5, 0.5), (0.8, 0.2)].into_iter().enumerate() {
            report.record(result(epoch + 1, 7, 1.0, a));
            report.record(result(epoch + 1, 8, 0.0, b));
        }
        report.record(result(3, 9, 1.0, 0.5));
        report.record(result(1, 9, 1.0, 0.4));

        assert_eq!(report.progress[&7].values, vec![0.2, 0.5, 0.8]);
        let stat = report.stat();
        // only epoch 3 counts toward accuracy
        assert_eq!(stat.total_samples, 3);
        let c = stat.convergence.unwrap();
        assert_eq!((c.samples, c.good), (3, 2));
        assert_eq!((c.zero_samples, c.good_zero), (1, 1));
        assert_eq!((c.one_samples, c.good_one), (2, 1));
        assert_abs_diff_eq!(c.good_one_percent(), 50.0);
    }

    #[test]
    fn empty_report_has_zero_percentages() {
        let stat = TestReport::new(None).stat();
        assert_eq!(stat.total_samples, 0);
        assert_abs_diff_eq!(stat.accuracy, 0.0);
        assert!(stat.convergence.is_none());
    }
}
