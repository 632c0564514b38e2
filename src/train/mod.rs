pub mod epoch_stats;
pub mod loop_fn;
pub mod stats;
pub mod tester;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::EpochStats;
pub use loop_fn::{train_loop, TrainOutcome};
pub use stats::{Convergence, LineProgress, Stat, TestReport, TestResult};
pub use tester::{test_file_pass, test_pass, test_records};
pub use train_config::TrainConfig;
pub use trainer::{train_file_epoch, train_one_epoch_pass, PassLoss};
