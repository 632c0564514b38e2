use serde::{Serialize, Deserialize};

/// Summary of one training pass, logged at the end of every epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Samples trained on during the pass.
    pub samples: usize,
    /// Mean squared error of the outputs seen before each update.
    pub train_loss: f32,
    /// Headline accuracy of the test pass that followed, if one ran.
    pub test_accuracy: Option<f32>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
