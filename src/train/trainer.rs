use crate::data::{FileParser, RecordSource};
use crate::error::{MlpError, Result};
use crate::loss::MseLoss;
use crate::network::Network;

/// Sums the per-sample loss of a pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassLoss {
    pub samples: usize,
    pub total: f32,
}

impl PassLoss {
    pub fn mean(&self) -> f32 {
        if self.samples == 0 { 0.0 } else { self.total / self.samples as f32 }
    }
}

/// Online training over a record stream: forward, backward and update for
/// every record, in order, until the stream ends or `max_records` is reached.
///
/// A malformed line aborts the pass with its error.
pub fn train_one_epoch_pass(
    network: &mut Network,
    source: &mut dyn RecordSource,
    max_records: Option<usize>,
) -> Result<PassLoss> {
    let mut loss = PassLoss::default();
    while max_records.map_or(true, |max| loss.samples < max) {
        let Some(record) = source.next_record()? else { break };
        if record.outputs.len() != network.output_size() {
            return Err(MlpError::CsvParsingErrorColumnsSize {
                line: source.line_number(),
                found: record.inputs.len() + record.outputs.len(),
                expected: network.input_size() + network.output_size(),
            });
        }
        let outputs = network.train_sample(&record);
        loss.total += MseLoss::loss(&outputs, &record.outputs);
        loss.samples += 1;
    }
    Ok(loss)
}

/// One epoch over the training prefix of a dataset file: rewinds, then trains
/// on every line before the training-ratio line.
pub fn train_file_epoch(network: &mut Network, parser: &mut FileParser) -> Result<PassLoss> {
    let ratio_line = parser.training_ratio_line()?;
    if ratio_line == 0 {
        return Err(MlpError::InvalidTrainingRatioTooSmall);
    }
    parser.reset_pos()?;
    let loss = train_one_epoch_pass(network, parser, Some(ratio_line))?;
    log::debug!(
        "trained on {} lines of {}",
        loss.samples,
        parser.path().display()
    );
    Ok(loss)
}
