pub mod activation;
pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optim;
pub mod session;
pub mod train;

// Convenience re-exports
pub use activation::{Activation, ActivationFunction};
pub use config::{AppParameters, Mode, PredictOutputFormat};
pub use data::{ColumnLayout, FileParser, LineParser, Record, RecordSource, StreamParser};
pub use error::{ErrorKind, MlpError, Result};
pub use layers::{Layer, LayerKind, Neuron};
pub use loss::MseLoss;
pub use network::{Network, NetworkParameters};
pub use optim::{Adam, Optimizer, OptimizerKind, Sgd};
pub use session::{RunSummary, Session};
pub use train::{train_loop, train_one_epoch_pass, test_pass, EpochStats, Stat, TestReport, TrainConfig};
