/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`             : number of passes over the training prefix
/// - `monitored_output`   : when set, the testing suffix is tested after every
///                           epoch and this output's value is tracked per line
/// - `test_after_training`: test the suffix once after the last epoch
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub monitored_output: Option<usize>,
    pub test_after_training: bool,
}

impl TrainConfig {
    /// Training only, no testing.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            monitored_output: None,
            test_after_training: false,
        }
    }

    pub fn monitored(epochs: usize, output_index: usize) -> Self {
        TrainConfig {
            epochs,
            monitored_output: Some(output_index),
            test_after_training: false,
        }
    }

    pub fn then_test(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            monitored_output: None,
            test_after_training: true,
        }
    }

    pub fn tests(&self) -> bool {
        self.monitored_output.is_some() || self.test_after_training
    }
}
