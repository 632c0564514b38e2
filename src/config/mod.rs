pub mod app_parameters;
pub mod predict_format;

pub use app_parameters::{AppParameters, Mode};
pub use predict_format::PredictOutputFormat;

pub use crate::data::ColumnLayout;
pub use crate::optim::OptimizerKind;
