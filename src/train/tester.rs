use crate::data::{FileParser, RecordSource};
use crate::error::{MlpError, Result};
use crate::network::Network;
use crate::train::stats::{Stat, TestReport, TestResult};

/// Forward-only pass over a record stream; every record becomes a
/// [`TestResult`] tagged with `epoch` and appended to `report`.
pub fn test_pass(
    network: &mut Network,
    source: &mut dyn RecordSource,
    epoch: usize,
    report: &mut TestReport,
) -> Result<usize> {
    let mut tested = 0;
    while let Some(record) = source.next_record()? {
        if record.outputs.len() != network.output_size() {
            return Err(MlpError::CsvParsingErrorColumnsSize {
                line: source.line_number(),
                found: record.inputs.len() + record.outputs.len(),
                expected: network.input_size() + network.output_size(),
            });
        }
        let output = network.forward(&record.inputs);
        report.record(TestResult {
            epoch,
            line: source.line_number(),
            expected: record.outputs,
            output,
        });
        tested += 1;
    }
    Ok(tested)
}

/// Tests a whole stream and returns its statistics.
pub fn test_records(network: &mut Network, source: &mut dyn RecordSource) -> Result<Stat> {
    let mut report = TestReport::new(None);
    test_pass(network, source, 1, &mut report)?;
    Ok(report.stat())
}

/// Tests the suffix of a dataset file that starts at the training-ratio line.
/// Earlier lines are re-read and discarded.
pub fn test_file_pass(
    network: &mut Network,
    parser: &mut FileParser,
    epoch: usize,
    report: &mut TestReport,
) -> Result<usize> {
    let ratio_line = parser.training_ratio_line()?;
    let total_lines = parser.total_lines()?;
    if ratio_line >= total_lines {
        return Err(MlpError::InvalidTrainingRatioTooBig { ratio_line, total_lines });
    }
    parser.reset_pos()?;
    parser.skip_to_line(ratio_line)?;
    let tested = test_pass(network, parser, epoch, report)?;
    log::debug!("epoch {}: tested {} lines from line {}", epoch, tested, ratio_line + 1);
    Ok(tested)
}
