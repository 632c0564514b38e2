use std::time::Instant;

use crate::data::FileParser;
use crate::error::{MlpError, Result};
use crate::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::stats::TestReport;
use crate::train::tester::test_file_pass;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::train_file_epoch;

/// What a `train_loop` run produced.
#[derive(Debug, Clone, Default)]
pub struct TrainOutcome {
    pub epochs: Vec<EpochStats>,
    /// Present when the configuration asked for testing.
    pub report: Option<TestReport>,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs over the training prefix of
/// `parser`'s file, testing the remaining lines as configured.
///
/// When testing is requested, the test suffix is checked before the first
/// epoch so that an empty suffix fails before any training happens.
pub fn train_loop(
    network: &mut Network,
    parser: &mut FileParser,
    config: &TrainConfig,
) -> Result<TrainOutcome> {
    if let Some(index) = config.monitored_output {
        if index >= network.output_size() {
            return Err(MlpError::parameter(
                "output_index_to_monitor",
                format!("{} is out of range for {} outputs", index, network.output_size()),
            ));
        }
    }
    if config.tests() {
        let ratio_line = parser.training_ratio_line()?;
        let total_lines = parser.total_lines()?;
        if ratio_line >= total_lines {
            return Err(MlpError::InvalidTrainingRatioTooBig { ratio_line, total_lines });
        }
    }

    let mut outcome = TrainOutcome {
        epochs: Vec::with_capacity(config.epochs),
        report: config.tests().then(|| TestReport::new(config.monitored_output)),
    };

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        // ── One full pass over the training prefix ────────────────────────
        let loss = train_file_epoch(network, parser)?;

        // ── Monitored testing ─────────────────────────────────────────────
        let mut test_accuracy = None;
        if config.monitored_output.is_some() {
            if let Some(report) = outcome.report.as_mut() {
                test_file_pass(network, parser, epoch, report)?;
                test_accuracy = Some(report.stat().accuracy);
            }
        }

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            samples: loss.samples,
            train_loss: loss.mean(),
            test_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        match stats.test_accuracy {
            Some(acc) => log::info!(
                "epoch {}/{}: loss {:.6}, accuracy {:.2}% ({} ms)",
                stats.epoch, stats.total_epochs, stats.train_loss, acc, stats.elapsed_ms
            ),
            None => log::info!(
                "epoch {}/{}: loss {:.6} ({} ms)",
                stats.epoch, stats.total_epochs, stats.train_loss, stats.elapsed_ms
            ),
        }
        outcome.epochs.push(stats);
    }

    // ── Single test pass after training ───────────────────────────────────
    if config.test_after_training && config.monitored_output.is_none() {
        if let Some(report) = outcome.report.as_mut() {
            test_file_pass(network, parser, config.epochs, report)?;
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnLayout, LineParser};
    use crate::network::NetworkParameters;
    use crate::optim::OptimizerKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn setup(lines: usize, ratio: f32) -> (NamedTempFile, Network, FileParser) {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..lines {
            let a = i % 2;
            let b = (i / 2) % 2;
            writeln!(file, "{},{},{}", a, b, a ^ b).unwrap();
        }
        let params = NetworkParameters {
            input_size: 2,
            hidden_size: 4,
            output_size: 1,
            learning_rate: 0.5,
            ..Default::default()
        };
        let net = Network::build(params, OptimizerKind::Sgd).unwrap();
        let mut parser = FileParser::new(file.path(), LineParser::new(2, 1, ColumnLayout::InputFirst))
            .with_training_ratio(ratio, None);
        parser.open().unwrap();
        (file, net, parser)
    }

    #[test]
    fn monitored_mode_tests_every_epoch() {
        let (_file, mut net, mut parser) = setup(10, 0.6);
        let outcome = train_loop(&mut net, &mut parser, &TrainConfig::monitored(3, 0)).unwrap();
        assert_eq!(outcome.epochs.len(), 3);
        assert!(outcome.epochs.iter().all(|e| e.samples == 6 && e.test_accuracy.is_some()));
        let report = outcome.report.unwrap();
        assert_eq!(report.results.len(), 12);
        assert!(report.progress.values().all(|p| p.values.len() == 3));
        assert_eq!(report.stat().total_samples, 4);
    }

    #[test]
    fn then_test_mode_tests_once() {
        let (_file, mut net, mut parser) = setup(10, 0.6);
        let outcome = train_loop(&mut net, &mut parser, &TrainConfig::then_test(2)).unwrap();
        let report = outcome.report.unwrap();
        assert_eq!(report.results.len(), 4);
        assert!(report.progress.is_empty());
    }

    #[test]
    fn train_only_has_no_report() {
        let (_file, mut net, mut parser) = setup(8, 1.0);
        let outcome = train_loop(&mut net, &mut parser, &TrainConfig::new(2)).unwrap();
        assert!(outcome.report.is_none());
        assert_eq!(outcome.epochs[1].samples, 8);
    }

    #[test]
    fn monitored_index_must_exist() {
        let (_file, mut net, mut parser) = setup(10, 0.6);
        assert!(matches!(
            train_loop(&mut net, &mut parser, &TrainConfig::monitored(1, 3)),
            Err(MlpError::InvalidParameter { .. })
        ));
    }
}
